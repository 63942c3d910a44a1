//! Remote EmotiCat backend
//!
//! The flows depend on the narrow traits below rather than on the HTTP client,
//! so tests can substitute counting or scripted backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::ApiResult;
use crate::models::{
    AnalyzeRequest, AnalyzeResponse, AuthResponse, Credentials, EmotionDetails, Pet, PetForm,
};

pub mod client;

pub use client::HttpApiClient;

/// Source of raw image bytes by image key
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_image(&self, key: &str) -> ApiResult<Bytes>;
}

/// Emotion analysis and detail lookup
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, request: &AnalyzeRequest) -> ApiResult<AnalyzeResponse>;

    async fn emotion_details(&self, label: &str) -> ApiResult<EmotionDetails>;
}

/// Pet record CRUD; forms arrive with their image already normalized
#[async_trait]
pub trait PetBackend: Send + Sync {
    async fn list_pets(&self) -> ApiResult<Vec<Pet>>;

    async fn get_pet(&self, id: i64) -> ApiResult<Pet>;

    async fn create_pet(&self, form: &PetForm) -> ApiResult<Pet>;

    async fn update_pet(&self, id: i64, form: &PetForm) -> ApiResult<Pet>;

    async fn delete_pet(&self, id: i64) -> ApiResult<()>;
}

/// Account endpoints
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse>;

    async fn register(&self, credentials: &Credentials) -> ApiResult<AuthResponse>;
}
