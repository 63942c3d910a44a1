/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// API defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONNECT_TIMEOUT: &str = "10s";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "60s";
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024; // 20MB

// Endpoint paths
pub const DEFAULT_ANALYZE_PATH: &str = "/analyze-cat";
pub const DEFAULT_EMOTION_DETAILS_PATH: &str = "/get-emotion-details";
pub const DEFAULT_IMAGE_PATH: &str = "/pet-image";
pub const DEFAULT_PETS_PATH: &str = "/pets";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_REGISTER_PATH: &str = "/register";

// Storage defaults
pub const DEFAULT_DATA_DIR: &str = "./data";
// Names under the data directory when no explicit path is configured
pub const IMAGE_CACHE_DIR_NAME: &str = "image-cache";
pub const SESSION_FILE_NAME: &str = "session.json";
pub const PET_LIST_FILE_NAME: &str = "pet-list.json";

// Analysis normalization defaults
pub const DEFAULT_ANALYSIS_TARGET_SIZE: u32 = 512;
pub const DEFAULT_ANALYSIS_QUALITY: f32 = 0.7;
pub const DEFAULT_ERROR_PREFIX: &str = "ERROR:";

// Profile picture normalization defaults
pub const DEFAULT_PROFILE_TARGET_SIZE: u32 = 384;
pub const DEFAULT_PROFILE_QUALITY: f32 = 0.8;

// Pet list defaults
pub const DEFAULT_PET_LIST_FRESHNESS: &str = "5m";

// Environment overrides
pub const ENV_API_URL: &str = "EMOTICAT_API_URL";
