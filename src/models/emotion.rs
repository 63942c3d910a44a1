use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Emoji shown for a label outside the known taxonomy
pub const FALLBACK_EMOJI: &str = "🐱";

/// Emoji shown for a failed analysis
pub const FAILURE_EMOJI: &str = "❓";

/// Emotion reported by the analysis service
///
/// Labels outside the known taxonomy are kept verbatim in `Other` and render
/// with [`FALLBACK_EMOJI`]. On the wire an emotion is its plain label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Emotion {
    Content,
    Happy,
    Curious,
    Affectionate,
    Scared,
    Aggressive,
    Annoyed,
    Anxious,
    Sad,
    Bored,
    Sleepy,
    Other(String),
}

impl Emotion {
    pub const KNOWN: [Emotion; 11] = [
        Emotion::Content,
        Emotion::Happy,
        Emotion::Curious,
        Emotion::Affectionate,
        Emotion::Scared,
        Emotion::Aggressive,
        Emotion::Annoyed,
        Emotion::Anxious,
        Emotion::Sad,
        Emotion::Bored,
        Emotion::Sleepy,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Emotion::Content => "Content",
            Emotion::Happy => "Happy",
            Emotion::Curious => "Curious",
            Emotion::Affectionate => "Affectionate",
            Emotion::Scared => "Scared",
            Emotion::Aggressive => "Aggressive",
            Emotion::Annoyed => "Annoyed",
            Emotion::Anxious => "Anxious",
            Emotion::Sad => "Sad",
            Emotion::Bored => "Bored",
            Emotion::Sleepy => "Sleepy",
            Emotion::Other(label) => label.as_str(),
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Emotion::Content => "😺",
            Emotion::Happy => "😸",
            Emotion::Curious => "🐱",
            Emotion::Affectionate => "😽",
            Emotion::Scared => "🙀",
            Emotion::Aggressive => "😾",
            Emotion::Annoyed => "😼",
            Emotion::Anxious | Emotion::Sad => "😿",
            Emotion::Bored => "🐈",
            Emotion::Sleepy => "😴",
            Emotion::Other(_) => FALLBACK_EMOJI,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Emotion::Other(_))
    }

    /// Parse a label as the service sends it; surrounding whitespace and case are ignored
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self::KNOWN
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(label))
            .unwrap_or_else(|| Emotion::Other(label.to_string()))
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("Emotion label is empty".to_string());
        }
        Ok(Self::from_label(s))
    }
}

impl From<String> for Emotion {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<Emotion> for String {
    fn from(emotion: Emotion) -> Self {
        match emotion {
            Emotion::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

/// Emoji for an arbitrary label, falling back for anything unrecognized
pub fn emoji_for_label(label: &str) -> &'static str {
    Emotion::from_label(label).emoji()
}

/// One analysis result in a pet's mood history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionRecord {
    /// Key of the analyzed photo in remote storage
    #[serde(rename = "image", alias = "image_key", alias = "imageKey")]
    pub image_key: String,
    pub emotion: Emotion,
    #[serde(rename = "emotionText", alias = "description")]
    pub description: String,
    #[serde(rename = "tipsAndRecs", alias = "tips", default)]
    pub tips: Vec<String>,
    /// Capture time, epoch milliseconds
    pub timestamp: i64,
}

impl EmotionRecord {
    pub fn emoji(&self) -> &'static str {
        self.emotion.emoji()
    }
}

/// Description and tips for one emotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionDetails {
    pub description: String,
    #[serde(rename = "tipsAndRecs", alias = "tips", default)]
    pub tips: Vec<String>,
}
