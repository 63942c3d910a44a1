use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::emotion::EmotionRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default, with = "birthday_format")]
    pub birthday: Option<NaiveDate>,
    #[serde(default, alias = "imageKey")]
    pub image_key: Option<String>,
    /// Most recent first
    #[serde(default, rename = "emotionHistory", alias = "emotion_history")]
    pub emotion_history: Vec<EmotionRecord>,
}

impl Pet {
    pub fn latest_record(&self) -> Option<&EmotionRecord> {
        self.emotion_history.first()
    }
}

/// Form fields for add/update; the image travels as a separate multipart part
#[derive(Debug, Clone, Default)]
pub struct PetForm {
    pub name: String,
    pub breed: Option<String>,
    pub birthday: Option<NaiveDate>,
    /// Raw photo bytes as picked by the user, normalized before upload
    pub image: Option<Vec<u8>>,
}

/// The backend answers pet mutations either with the pet or with `{ "pet": ... }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PetEnvelope {
    Wrapped { pet: Pet },
    Bare(Pet),
}

impl PetEnvelope {
    pub fn into_pet(self) -> Pet {
        match self {
            PetEnvelope::Wrapped { pet } => pet,
            PetEnvelope::Bare(pet) => pet,
        }
    }
}

/// Pet list responses: a bare array or `{ "pets": [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PetListEnvelope {
    Wrapped { pets: Vec<Pet> },
    Bare(Vec<Pet>),
}

impl PetListEnvelope {
    pub fn into_pets(self) -> Vec<Pet> {
        match self {
            PetListEnvelope::Wrapped { pets } => pets,
            PetListEnvelope::Bare(pets) => pets,
        }
    }
}

/// Birthdays arrive as ISO dates or full ISO date-times; only the date is kept
pub mod birthday_format {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
            .or_else(|| value.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
    }

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_some(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("Invalid birthday '{s}'"))),
        }
    }
}
