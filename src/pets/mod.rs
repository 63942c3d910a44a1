//! Pet records: local store, list cache, backend CRUD and mood summaries

pub mod list_cache;
pub mod mood;
pub mod service;
pub mod store;

pub use list_cache::PetListCache;
pub use mood::{RecentMood, age_in_years, recent_mood, top_moods};
pub use service::PetService;
pub use store::PetStore;
