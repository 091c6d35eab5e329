//! # Sintropia
//!
//! Inventory and planning backend for syntropic-agriculture gardens: a species
//! catalog, sites, plantations, plots and the plant instances placed in them,
//! served over a JSON REST API.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! sintropia = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sintropia::auth::StaticTokenVerifier;
//! use sintropia::config::PaginationLimits;
//! use sintropia::server::{AppState, create_router};
//! use sintropia::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/sintropia.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(store),
//!     Arc::new(StaticTokenVerifier::default()),
//!     PaginationLimits::default(),
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `sintropia` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
