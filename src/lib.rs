pub mod analysis;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod errors;
pub mod image_cache;
pub mod models;
pub mod pets;
pub mod session;
pub mod utils;

pub use context::AppContext;
