//! Data model shared by the client flows and the wire format

pub mod analysis;
pub mod auth;
pub mod emotion;
pub mod pet;

pub use analysis::*;
pub use auth::*;
pub use emotion::*;
pub use pet::*;
