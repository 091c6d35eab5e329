mod server;

pub use server::{PaginationLimits, ServerConfig, TokenEntry};
