use serde::{Deserialize, Serialize};

use super::emotion::EmotionDetails;

/// Body of the analysis request
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    /// Base64 of the normalized JPEG
    pub image: String,
    #[serde(rename = "petId")]
    pub pet_id: i64,
}

/// Analysis response; fields are optional so missing ones surface as a
/// malformed-response failure rather than a JSON error
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeResponse {
    /// Emotion label, or an error-prefixed message
    #[serde(default, alias = "label")]
    pub message: Option<String>,
    #[serde(default, rename = "imageKey", alias = "image_key")]
    pub image_key: Option<String>,
    #[serde(default, rename = "emotionDetails", alias = "emotion_details")]
    pub emotion_details: Option<EmbeddedDetails>,
}

/// Detail object the analysis endpoint may embed; incomplete ones are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddedDetails {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "tipsAndRecs", alias = "tips")]
    pub tips: Option<Vec<String>>,
}

impl EmbeddedDetails {
    pub fn into_complete(self) -> Option<EmotionDetails> {
        match (self.description, self.tips) {
            (Some(description), Some(tips)) if !description.trim().is_empty() => {
                Some(EmotionDetails { description, tips })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmotionDetailsRequest {
    pub emotion: String,
}
