//! Application context: every shared service, built once from configuration

use std::sync::Arc;
use tracing::info;

use crate::analysis::AnalysisPipeline;
use crate::api::HttpApiClient;
use crate::auth::AuthService;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::image_cache::ImageCache;
use crate::pets::{PetListCache, PetService, PetStore};
use crate::session::SessionStore;
use crate::utils::ImageNormalizer;

/// Handles to the client's shared state and services; cheap to clone
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub session: SessionStore,
    pub client: Arc<HttpApiClient>,
    pub image_cache: ImageCache,
    pub pets: PetStore,
    pub pet_service: PetService,
    pub auth: AuthService,
    pub analysis: AnalysisPipeline,
}

impl AppContext {
    pub async fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.storage.data_dir)
            .await
            .map_err(|e| {
                AppError::configuration(format!(
                    "Cannot create data directory {}: {e}",
                    config.storage.data_dir.display()
                ))
            })?;

        let session = SessionStore::load(config.storage.session_file()).await;
        let client = Arc::new(HttpApiClient::new(config.api.clone(), session.clone())?);

        let image_cache = ImageCache::open(config.storage.image_cache_dir(), client.clone()).await?;

        let pets = PetStore::new();
        let list_cache =
            PetListCache::new(config.storage.pet_list_file(), config.pets.list_freshness);
        let pet_service = PetService::new(
            client.clone(),
            pets.clone(),
            list_cache.clone(),
            ImageNormalizer::new(config.profile_image),
        );

        let auth = AuthService::new(client.clone(), session.clone());

        let analysis = AnalysisPipeline::new(
            client.clone(),
            pets.clone(),
            ImageNormalizer::new(config.analysis.normalization()),
            config.analysis.error_prefix.clone(),
        )
        .with_list_cache(list_cache);

        info!(
            "EmotiCat client initialized against {} (data in {})",
            config.api.base_url,
            config.storage.data_dir.display()
        );

        Ok(Self {
            config: Arc::new(config),
            session,
            client,
            image_cache,
            pets,
            pet_service,
            auth,
            analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_creates_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_base_url("http://127.0.0.1:9", dir.path().join("data"));

        let context = AppContext::initialize(config).await.unwrap();

        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("data/image-cache").is_dir());
        assert!(context.session.current().await.is_none());
        assert!(context.pets.is_empty().await);
        assert!(context.image_cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_initialize_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::for_base_url("http://127.0.0.1:9", dir.path());
        config.analysis.quality = 1.5;

        assert!(matches!(
            AppContext::initialize(config).await,
            Err(AppError::Configuration { .. })
        ));
    }
}
