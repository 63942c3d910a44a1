//! Local cache of remote pet images
//!
//! Maps opaque image keys to files under the cache directory. The first
//! successful fetch of a key writes its bytes to a path derived from the key
//! and records the mapping; later resolves are served from disk. The mapping
//! is persisted as `index.json` next to the cached files.

pub mod entry;
pub mod path;
pub mod service;

pub use entry::{CacheEntry, CacheStats};
pub use path::derive_relative_path;
pub use service::ImageCache;
