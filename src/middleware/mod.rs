// Middleware module
pub mod cache_invalidation;
pub mod main_middleware;

pub use main_middleware::*;
