use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::stage::{AnalysisAttempt, AnalysisFailure, AnalysisOutcome, AnalysisProgress, AnalysisStage};
use crate::api::AnalysisBackend;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::models::{AnalyzeRequest, AnalyzeResponse, Emotion, EmotionDetails, EmotionRecord};
use crate::pets::{PetListCache, PetStore};
use crate::utils::ImageNormalizer;

/// Buffered progress events per subscriber before the slowest one lags
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Photo and pet selected for one analysis
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub pet_id: Option<i64>,
    /// Raw photo bytes in any decodable format
    pub image: Option<Vec<u8>>,
}

impl AnalysisRequest {
    pub fn new(pet_id: i64, image: Vec<u8>) -> Self {
        Self {
            pet_id: Some(pet_id),
            image: Some(image),
        }
    }
}

/// Photo → normalized JPEG → remote analysis → record at the head of the pet's history
#[derive(Clone)]
pub struct AnalysisPipeline {
    backend: Arc<dyn AnalysisBackend>,
    pets: PetStore,
    list_cache: Option<PetListCache>,
    normalizer: ImageNormalizer,
    error_prefix: String,
    progress: broadcast::Sender<AnalysisProgress>,
}

impl AnalysisPipeline {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        pets: PetStore,
        normalizer: ImageNormalizer,
        error_prefix: impl Into<String>,
    ) -> Self {
        let (progress, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            backend,
            pets,
            list_cache: None,
            normalizer,
            error_prefix: error_prefix.into(),
            progress,
        }
    }

    /// Keep this persisted pet list in step with recorded analyses
    pub fn with_list_cache(mut self, list_cache: PetListCache) -> Self {
        self.list_cache = Some(list_cache);
        self
    }

    /// Stage changes of every attempt started after subscribing
    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisProgress> {
        self.progress.subscribe()
    }

    /// Run one attempt to its terminal stage; failures are returned, not raised
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisOutcome {
        let mut attempt = AnalysisAttempt::new(request.pet_id);

        let outcome = match self.run(&mut attempt, request).await {
            Ok(record) => {
                info!(
                    "Analysis {} succeeded: pet {:?} is {} {}",
                    attempt.id(),
                    attempt.pet_id(),
                    record.emotion,
                    record.emoji()
                );
                AnalysisOutcome::Succeeded(record)
            }
            Err(e) => {
                warn!(
                    "Analysis {} failed in stage {}: {}",
                    attempt.id(),
                    attempt.stage(),
                    e
                );
                AnalysisOutcome::Failed(AnalysisFailure::from(&e))
            }
        };

        if let Err(e) = attempt.transition(outcome.clone().into_stage()) {
            warn!("Analysis {} could not record its outcome: {}", attempt.id(), e);
        }
        self.publish(&attempt);
        outcome
    }

    async fn run(
        &self,
        attempt: &mut AnalysisAttempt,
        request: AnalysisRequest,
    ) -> AnalysisResult<EmotionRecord> {
        let pet_id = request
            .pet_id
            .ok_or_else(|| AnalysisError::validation("Please select a pet first"))?;
        let image = request
            .image
            .filter(|image| !image.is_empty())
            .ok_or_else(|| AnalysisError::validation("Please take or select a photo first"))?;
        if !self.pets.contains(pet_id).await {
            return Err(AnalysisError::UnknownPet { pet_id });
        }

        let captured_at = self.advance(attempt, AnalysisStage::Preparing)?;
        let normalized = self.normalizer.normalize(&image)?;
        let body = AnalyzeRequest {
            image: normalized.to_base64(),
            pet_id,
        };

        self.advance(attempt, AnalysisStage::Submitting)?;
        let response = self.backend.analyze(&body).await?;
        let (image_key, emotion, embedded) = self.interpret(response)?;

        let details = match embedded {
            Some(details) => details,
            None => {
                debug!("Fetching details for {}", emotion);
                self.backend.emotion_details(emotion.as_str()).await?
            }
        };
        if details.description.trim().is_empty() {
            return Err(AnalysisError::malformed("emotion details without description"));
        }

        let record = EmotionRecord {
            image_key,
            emotion,
            description: details.description,
            tips: details.tips,
            timestamp: captured_at.timestamp_millis(),
        };

        self.pets
            .add_emotion_record(pet_id, record.clone())
            .await
            .map_err(|_| AnalysisError::UnknownPet { pet_id })?;
        self.persist_history(pet_id).await;

        Ok(record)
    }

    async fn persist_history(&self, pet_id: i64) {
        let (Some(list_cache), Some(pet)) = (&self.list_cache, self.pets.get(pet_id).await) else {
            return;
        };
        if let Err(e) = list_cache.refresh_pet(&pet).await {
            // The record stays in memory; the next listing may drop it
            warn!("Failed to persist history of pet {}: {}", pet_id, e);
        }
    }

    /// Split a response into image key, emotion and complete embedded details
    fn interpret(
        &self,
        response: AnalyzeResponse,
    ) -> AnalysisResult<(String, Emotion, Option<EmotionDetails>)> {
        let label = response
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AnalysisError::malformed("response has no label"))?;

        if label.starts_with(&self.error_prefix) {
            return Err(AnalysisError::InBand { label });
        }

        let image_key = response
            .image_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AnalysisError::malformed("response has no image key"))?;

        let emotion = Emotion::from_label(&label);
        if !emotion.is_known() {
            debug!("Label '{}' is outside the known emotions", label);
        }

        let embedded = response
            .emotion_details
            .and_then(|details| details.into_complete());

        Ok((image_key, emotion, embedded))
    }

    /// Move the attempt forward and publish it; returns the capture time
    fn advance(
        &self,
        attempt: &mut AnalysisAttempt,
        next: AnalysisStage,
    ) -> AnalysisResult<DateTime<Utc>> {
        let captured_at = attempt.transition(next)?;
        debug!("Analysis {} entered {}", attempt.id(), attempt.stage());
        self.publish(attempt);
        Ok(captured_at)
    }

    fn publish(&self, attempt: &AnalysisAttempt) {
        // No subscribers is fine
        let _ = self.progress.send(attempt.progress());
    }
}
