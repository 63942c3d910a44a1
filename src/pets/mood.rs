//! Summaries derived from a pet's emotion history

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::fmt;

use crate::models::{Emotion, EmotionRecord, Pet};

/// How many moods the history view lists
pub const DEFAULT_TOP_MOODS: usize = 4;

/// Latest recorded emotion and whole hours since it was captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentMood {
    pub emotion: Emotion,
    pub hours_ago: i64,
}

impl fmt::Display for RecentMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} hours ago)", self.emotion, self.hours_ago)
    }
}

pub fn recent_mood(pet: &Pet, now: DateTime<Utc>) -> Option<RecentMood> {
    let latest = pet.latest_record()?;
    let elapsed_ms = (now.timestamp_millis() - latest.timestamp).max(0);
    Some(RecentMood {
        emotion: latest.emotion.clone(),
        hours_ago: elapsed_ms / (60 * 60 * 1000),
    })
}

/// Emotions by occurrence count, highest first; ties keep history order
pub fn top_moods(history: &[EmotionRecord], limit: usize) -> Vec<(Emotion, usize)> {
    let mut counts: Vec<(Emotion, usize)> = Vec::new();
    for record in history {
        match counts.iter_mut().find(|(e, _)| *e == record.emotion) {
            Some((_, count)) => *count += 1,
            None => counts.push((record.emotion.clone(), 1)),
        }
    }
    // Stable sort
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

/// Whole years between `birthday` and `today`
pub fn age_in_years(birthday: Option<NaiveDate>, today: NaiveDate) -> Option<u32> {
    let birthday = birthday?;
    if birthday > today {
        return Some(0);
    }
    let mut years = today.year() - birthday.year();
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}
