//! Stages of one analysis attempt and the transitions between them

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::errors::{AnalysisError, AnalysisResult, ErrorCategory};
use crate::models::{EmotionRecord, FAILURE_EMOJI};

/// Where an attempt currently is; `Succeeded` and `Failed` are terminal
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisStage {
    Idle,
    Preparing,
    Submitting,
    Succeeded(EmotionRecord),
    Failed(AnalysisFailure),
}

impl AnalysisStage {
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisStage::Idle => "idle",
            AnalysisStage::Preparing => "preparing",
            AnalysisStage::Submitting => "submitting",
            AnalysisStage::Succeeded(_) => "succeeded",
            AnalysisStage::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStage::Succeeded(_) | AnalysisStage::Failed(_))
    }

    /// Whether `next` may directly follow this stage
    fn allows(&self, next: &AnalysisStage) -> bool {
        matches!(
            (self, next),
            (AnalysisStage::Idle, AnalysisStage::Preparing)
                | (AnalysisStage::Preparing, AnalysisStage::Submitting)
                | (AnalysisStage::Submitting, AnalysisStage::Succeeded(_))
                | (
                    AnalysisStage::Idle | AnalysisStage::Preparing | AnalysisStage::Submitting,
                    AnalysisStage::Failed(_)
                )
        )
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why an attempt failed, in a form ready to show the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisFailure {
    pub category: ErrorCategory,
    /// User-facing, retry-prompting message
    pub message: String,
    /// Underlying error, for logs
    pub detail: String,
}

impl AnalysisFailure {
    pub fn emoji(&self) -> &'static str {
        FAILURE_EMOJI
    }
}

impl From<&AnalysisError> for AnalysisFailure {
    fn from(err: &AnalysisError) -> Self {
        Self {
            category: err.category(),
            message: err.user_message(),
            detail: err.to_string(),
        }
    }
}

/// Terminal result of [`AnalysisPipeline::analyze`](super::AnalysisPipeline::analyze)
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Succeeded(EmotionRecord),
    Failed(AnalysisFailure),
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Succeeded(_))
    }

    pub fn record(&self) -> Option<&EmotionRecord> {
        match self {
            AnalysisOutcome::Succeeded(record) => Some(record),
            AnalysisOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AnalysisFailure> {
        match self {
            AnalysisOutcome::Succeeded(_) => None,
            AnalysisOutcome::Failed(failure) => Some(failure),
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AnalysisOutcome::Succeeded(record) => record.emoji(),
            AnalysisOutcome::Failed(failure) => failure.emoji(),
        }
    }

    pub fn into_stage(self) -> AnalysisStage {
        match self {
            AnalysisOutcome::Succeeded(record) => AnalysisStage::Succeeded(record),
            AnalysisOutcome::Failed(failure) => AnalysisStage::Failed(failure),
        }
    }
}

/// Stage change published while an attempt runs
#[derive(Debug, Clone)]
pub struct AnalysisProgress {
    pub attempt_id: Uuid,
    pub pet_id: Option<i64>,
    pub stage: AnalysisStage,
}

/// One analysis attempt; stages only move forward
#[derive(Debug, Clone)]
pub struct AnalysisAttempt {
    id: Uuid,
    pet_id: Option<i64>,
    stage: AnalysisStage,
    started_at: Option<DateTime<Utc>>,
}

impl AnalysisAttempt {
    pub fn new(pet_id: Option<i64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pet_id,
            stage: AnalysisStage::Idle,
            started_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn pet_id(&self) -> Option<i64> {
        self.pet_id
    }

    pub fn stage(&self) -> &AnalysisStage {
        &self.stage
    }

    /// Capture time, set when the attempt leaves `Idle`
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Move to `next`, returning the capture time fixed by the first transition
    pub fn transition(&mut self, next: AnalysisStage) -> AnalysisResult<DateTime<Utc>> {
        if !self.stage.allows(&next) {
            return Err(AnalysisError::InvalidTransition {
                from: self.stage.name().to_string(),
                to: next.name().to_string(),
            });
        }
        // Only the move out of Idle finds this unset
        let started_at = *self.started_at.get_or_insert_with(Utc::now);
        self.stage = next;
        Ok(started_at)
    }

    pub fn progress(&self) -> AnalysisProgress {
        AnalysisProgress {
            attempt_id: self.id,
            pet_id: self.pet_id,
            stage: self.stage.clone(),
        }
    }
}
