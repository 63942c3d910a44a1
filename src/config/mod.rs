use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub profile_image: NormalizationConfig,
    #[serde(default)]
    pub pets: PetsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String, // This is the ONLY mandatory field
    #[serde(default = "default_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

/// Endpoint paths relative to `api.base_url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_analyze_path")]
    pub analyze: String,
    #[serde(default = "default_emotion_details_path")]
    pub emotion_details: String,
    #[serde(default = "default_image_path")]
    pub image: String,
    #[serde(default = "default_pets_path")]
    pub pets: String,
    #[serde(default = "default_login_path")]
    pub login: String,
    #[serde(default = "default_register_path")]
    pub register: String,
}

/// Local state locations; unset paths live under `data_dir`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_cache_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_list_file: Option<PathBuf>,
}

/// Square resize and JPEG quality applied before upload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    pub target_size: u32,
    /// Compression quality in [0, 1]
    pub quality: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analysis_target_size")]
    pub target_size: u32,
    #[serde(default = "default_analysis_quality")]
    pub quality: f32,
    /// Reserved label prefix signalling an in-band failure
    #[serde(default = "default_error_prefix")]
    pub error_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetsConfig {
    /// How long a fetched pet list is served without refetching
    #[serde(default = "default_pet_list_freshness", with = "duration_serde::duration")]
    pub list_freshness: Duration,
}

fn parse_default_duration(value: &str) -> Duration {
    humantime::parse_duration(value).unwrap_or(Duration::from_secs(60))
}

// API defaults
fn default_connect_timeout() -> Duration {
    parse_default_duration(DEFAULT_CONNECT_TIMEOUT)
}

fn default_request_timeout() -> Duration {
    parse_default_duration(DEFAULT_REQUEST_TIMEOUT)
}

fn default_max_image_bytes() -> u64 {
    DEFAULT_MAX_IMAGE_BYTES
}

fn default_analyze_path() -> String {
    DEFAULT_ANALYZE_PATH.to_string()
}

fn default_emotion_details_path() -> String {
    DEFAULT_EMOTION_DETAILS_PATH.to_string()
}

fn default_image_path() -> String {
    DEFAULT_IMAGE_PATH.to_string()
}

fn default_pets_path() -> String {
    DEFAULT_PETS_PATH.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_register_path() -> String {
    DEFAULT_REGISTER_PATH.to_string()
}

// Storage defaults
fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

// Analysis defaults
fn default_analysis_target_size() -> u32 {
    DEFAULT_ANALYSIS_TARGET_SIZE
}

fn default_analysis_quality() -> f32 {
    DEFAULT_ANALYSIS_QUALITY
}

fn default_error_prefix() -> String {
    DEFAULT_ERROR_PREFIX.to_string()
}

fn default_pet_list_freshness() -> Duration {
    parse_default_duration(DEFAULT_PET_LIST_FRESHNESS)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            analysis: AnalysisConfig::default(),
            profile_image: NormalizationConfig::default(),
            pets: PetsConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            max_image_bytes: default_max_image_bytes(),
            endpoints: EndpointConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            analyze: default_analyze_path(),
            emotion_details: default_emotion_details_path(),
            image: default_image_path(),
            pets: default_pets_path(),
            login: default_login_path(),
            register: default_register_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            image_cache_dir: None,
            session_file: None,
            pet_list_file: None,
        }
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_PROFILE_TARGET_SIZE,
            quality: DEFAULT_PROFILE_QUALITY,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_size: default_analysis_target_size(),
            quality: default_analysis_quality(),
            error_prefix: default_error_prefix(),
        }
    }
}

impl Default for PetsConfig {
    fn default() -> Self {
        Self {
            list_freshness: default_pet_list_freshness(),
        }
    }
}

impl AnalysisConfig {
    pub fn normalization(&self) -> NormalizationConfig {
        NormalizationConfig {
            target_size: self.target_size,
            quality: self.quality,
        }
    }
}

impl NormalizationConfig {
    pub fn validate(&self, section: &str) -> AppResult<()> {
        if self.target_size == 0 {
            return Err(AppError::configuration(format!(
                "{section}.target_size must be greater than zero"
            )));
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(AppError::configuration(format!(
                "{section}.quality must be within [0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

impl StorageConfig {
    /// Lay every path out under one data directory
    pub fn rooted_at<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn image_cache_dir(&self) -> PathBuf {
        self.resolve(self.image_cache_dir.as_ref(), IMAGE_CACHE_DIR_NAME)
    }

    pub fn session_file(&self) -> PathBuf {
        self.resolve(self.session_file.as_ref(), SESSION_FILE_NAME)
    }

    pub fn pet_list_file(&self) -> PathBuf {
        self.resolve(self.pet_list_file.as_ref(), PET_LIST_FILE_NAME)
    }

    fn resolve(&self, explicit: Option<&PathBuf>, name: &str) -> PathBuf {
        explicit
            .cloned()
            .unwrap_or_else(|| self.data_dir.join(name))
    }
}

impl Config {
    /// Default configuration talking to `base_url` and storing under `data_dir`
    pub fn for_base_url<P: AsRef<Path>>(base_url: &str, data_dir: P) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.to_string(),
                ..ApiConfig::default()
            },
            storage: StorageConfig::rooted_at(data_dir),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| {
            AppError::configuration(format!("api.base_url '{}' is invalid: {e}", self.api.base_url))
        })?;
        self.analysis.normalization().validate("analysis")?;
        self.profile_image.validate("profile_image")?;
        if self.analysis.error_prefix.is_empty() {
            return Err(AppError::configuration("analysis.error_prefix must not be empty"));
        }
        Ok(())
    }

    /// Apply environment overrides (`EMOTICAT_API_URL`)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL)
            && !url.trim().is_empty()
        {
            info!("Using API base URL from {}", ENV_API_URL);
            self.api.base_url = url;
        }
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://api.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.endpoints.analyze, "/analyze-cat");
        assert_eq!(config.analysis.target_size, 512);
        assert!((config.analysis.quality - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.analysis.error_prefix, "ERROR:");
        assert_eq!(config.profile_image.target_size, 384);
        assert_eq!(config.pets.list_freshness, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.analysis.quality = 1.5;
        assert!(matches!(
            config.validate(),
            Err(AppError::Configuration { .. })
        ));

        let mut config = Config::default();
        config.profile_image.target_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emoticat.toml");
        let path_str = path.to_str().unwrap();

        let created = Config::load_from_file(path_str).unwrap();
        assert!(path.exists());

        let reloaded = Config::load_from_file(path_str).unwrap();
        assert_eq!(created.api.base_url, reloaded.api.base_url);
        assert_eq!(created.pets.list_freshness, reloaded.pets.list_freshness);
    }

    #[test]
    fn test_rooted_storage() {
        let storage = StorageConfig::rooted_at("/tmp/emoticat");
        assert_eq!(storage.image_cache_dir(), PathBuf::from("/tmp/emoticat/image-cache"));
        assert_eq!(storage.session_file(), PathBuf::from("/tmp/emoticat/session.json"));
        assert_eq!(storage.pet_list_file(), PathBuf::from("/tmp/emoticat/pet-list.json"));
    }

    #[test]
    fn test_storage_paths_follow_data_dir() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://api.example.com"

            [storage]
            data_dir = "/var/lib/emoticat"
            session_file = "/run/emoticat/session.json"
            "#,
        )
        .unwrap();

        let storage = &config.storage;
        assert_eq!(storage.image_cache_dir(), PathBuf::from("/var/lib/emoticat/image-cache"));
        assert_eq!(storage.pet_list_file(), PathBuf::from("/var/lib/emoticat/pet-list.json"));
        assert_eq!(storage.session_file(), PathBuf::from("/run/emoticat/session.json"));

        let defaults = StorageConfig::default();
        assert_eq!(defaults.image_cache_dir(), PathBuf::from("./data/image-cache"));
    }
}
