mod catalog;
pub mod dto;
mod garden;
mod meta;
mod planting;
pub mod response;
mod router;

pub use router::{AppState, create_router};
