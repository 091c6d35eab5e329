pub mod constants;
mod models;

pub use models::*;
