use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use super::{AnalysisBackend, AuthBackend, ImageSource, PetBackend};
use crate::config::ApiConfig;
use crate::errors::{ApiError, ApiResult, AppError, AppResult};
use crate::models::{
    AnalyzeRequest, AnalyzeResponse, AuthResponse, Credentials, EmotionDetails,
    EmotionDetailsRequest, Pet, PetEnvelope, PetForm, PetListEnvelope,
};
use crate::session::SessionStore;
use crate::utils::url::UrlUtils;

/// Longest error body echoed back in a status error
const MAX_ERROR_BODY_CHARS: usize = 200;

/// reqwest-backed client for every backend endpoint
///
/// Each request attaches `Authorization: Bearer <token>` when the shared
/// [`SessionStore`] holds a session and omits the header otherwise.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    config: ApiConfig,
    session: SessionStore,
}

impl HttpApiClient {
    pub fn new(config: ApiConfig, session: SessionStore) -> AppResult<Self> {
        let client = Self::build_client(config.connect_timeout, config.request_timeout)?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    fn build_client(connect_timeout: Duration, request_timeout: Duration) -> AppResult<Client> {
        Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(concat!("emoticat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        UrlUtils::join(&self.config.base_url, path).map_err(|e| ApiError::InvalidRequest {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    fn pet_path(&self, id: i64) -> String {
        format!("{}/{id}", self.config.endpoints.pets.trim_end_matches('/'))
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.bearer().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> ApiResult<Response> {
        let response = self
            .authorize(request)
            .await
            .send()
            .await
            .map_err(|e| ApiError::network(endpoint, e.without_url()))?;

        Self::check_status(response, endpoint).await
    }

    /// Reject non-2xx responses, keeping a short excerpt of the body
    async fn check_status(response: Response, endpoint: &str) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("Unknown").to_string()
        } else {
            body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect()
        };

        Err(ApiError::Status {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
            message,
        })
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> ApiResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(endpoint, e.without_url()))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::malformed(endpoint, e))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        debug!("POST {}", UrlUtils::redact(&url));
        let response = self.send(self.client.post(url).json(body), path).await?;
        Self::parse_json(response, path).await
    }

    /// Read a body incrementally, failing once it passes `max_image_bytes`
    async fn read_limited(&self, response: Response, endpoint: &str) -> ApiResult<Bytes> {
        let max_size = self.config.max_image_bytes;
        let too_large = || ApiError::PayloadTooLarge {
            endpoint: endpoint.to_string(),
            max_size,
        };

        if let Some(length) = response.content_length()
            && length > max_size
        {
            return Err(too_large());
        }

        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ApiError::network(endpoint, e.without_url()))?;
            if (buffer.len() + chunk.len()) as u64 > max_size {
                return Err(too_large());
            }
            buffer.extend_from_slice(&chunk);
        }

        trace!("Read {} bytes from {}", buffer.len(), endpoint);
        Ok(buffer.freeze())
    }

    fn pet_form(form: &PetForm, endpoint: &str) -> ApiResult<Form> {
        let mut multipart = Form::new().text("name", form.name.clone());
        if let Some(breed) = &form.breed {
            multipart = multipart.text("breed", breed.clone());
        }
        if let Some(birthday) = form.birthday {
            multipart = multipart.text("birthday", birthday.format("%Y-%m-%d").to_string());
        }
        if let Some(image) = &form.image {
            let part = Part::bytes(image.clone())
                .file_name("pet.jpg")
                .mime_str("image/jpeg")
                .map_err(|e| ApiError::InvalidRequest {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                })?;
            multipart = multipart.part("image", part);
        }
        Ok(multipart)
    }
}

#[async_trait]
impl ImageSource for HttpApiClient {
    async fn fetch_image(&self, key: &str) -> ApiResult<Bytes> {
        let endpoint = &self.config.endpoints.image;
        let url = UrlUtils::join_key(&self.config.base_url, endpoint, key).map_err(|e| {
            ApiError::InvalidRequest {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            }
        })?;

        debug!("Fetching image '{}' from {}", key, UrlUtils::redact(&url));
        let response = self.send(self.client.get(url), endpoint).await?;
        self.read_limited(response, endpoint).await
    }
}

#[async_trait]
impl AnalysisBackend for HttpApiClient {
    async fn analyze(&self, request: &AnalyzeRequest) -> ApiResult<AnalyzeResponse> {
        debug!(
            "Submitting {} base64 chars for pet {}",
            request.image.len(),
            request.pet_id
        );
        self.post_json(&self.config.endpoints.analyze, request).await
    }

    async fn emotion_details(&self, label: &str) -> ApiResult<EmotionDetails> {
        let body = EmotionDetailsRequest {
            emotion: label.to_string(),
        };
        self.post_json(&self.config.endpoints.emotion_details, &body)
            .await
    }
}

#[async_trait]
impl PetBackend for HttpApiClient {
    async fn list_pets(&self) -> ApiResult<Vec<Pet>> {
        let path = &self.config.endpoints.pets;
        let url = self.url(path)?;
        debug!("GET {}", UrlUtils::redact(&url));
        let response = self.send(self.client.get(url), path).await?;
        let envelope: PetListEnvelope = Self::parse_json(response, path).await?;
        Ok(envelope.into_pets())
    }

    async fn get_pet(&self, id: i64) -> ApiResult<Pet> {
        let path = self.pet_path(id);
        let url = self.url(&path)?;
        debug!("GET {}", UrlUtils::redact(&url));
        let response = self.send(self.client.get(url), &path).await?;
        let envelope: PetEnvelope = Self::parse_json(response, &path).await?;
        Ok(envelope.into_pet())
    }

    async fn create_pet(&self, form: &PetForm) -> ApiResult<Pet> {
        let path = &self.config.endpoints.pets;
        let url = self.url(path)?;
        let multipart = Self::pet_form(form, path)?;
        debug!("POST {} (pet '{}')", UrlUtils::redact(&url), form.name);
        let response = self
            .send(self.client.post(url).multipart(multipart), path)
            .await?;
        let envelope: PetEnvelope = Self::parse_json(response, path).await?;
        Ok(envelope.into_pet())
    }

    async fn update_pet(&self, id: i64, form: &PetForm) -> ApiResult<Pet> {
        let path = self.pet_path(id);
        let url = self.url(&path)?;
        let multipart = Self::pet_form(form, &path)?;
        debug!("PUT {}", UrlUtils::redact(&url));
        let response = self
            .send(self.client.put(url).multipart(multipart), &path)
            .await?;
        let envelope: PetEnvelope = Self::parse_json(response, &path).await?;
        Ok(envelope.into_pet())
    }

    async fn delete_pet(&self, id: i64) -> ApiResult<()> {
        let path = self.pet_path(id);
        let url = self.url(&path)?;
        debug!("DELETE {}", UrlUtils::redact(&url));
        self.send(self.client.delete(url), &path).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for HttpApiClient {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        self.post_json(&self.config.endpoints.login, credentials)
            .await
    }

    async fn register(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        self.post_json(&self.config.endpoints.register, credentials)
            .await
    }
}
