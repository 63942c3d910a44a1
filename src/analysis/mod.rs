//! Emotion analysis request pipeline
//!
//! One attempt moves strictly forward through
//! `Idle → Preparing → Submitting → Succeeded | Failed`. Every failure,
//! whether local, transport-level or reported in-band by the backend,
//! converges on `Failed` with a category and a user-facing message.

pub mod pipeline;
pub mod stage;

pub use pipeline::{AnalysisPipeline, AnalysisRequest};
pub use stage::{AnalysisAttempt, AnalysisFailure, AnalysisOutcome, AnalysisProgress, AnalysisStage};
