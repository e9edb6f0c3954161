//! Free-text narrative generation.
//!
//! The pipeline treats generated text as opaque prose: it is neither parsed
//! nor validated, only inserted into the report.

pub mod openai;

pub use openai::OpenAiNarrator;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("Narrative request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Narrative response had no content")]
    EmptyResponse,

    #[error("Narrative service error: {0}")]
    Service(String),
}

/// A natural-language task plus the data it should reason about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeTask {
    /// Persona the generator should adopt
    pub role: String,
    pub instructions: String,
    pub context: String,
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, task: &NarrativeTask) -> Result<String, NarrativeError>;
}

/// Offline generator that restates the task context without a model.
pub struct TemplateNarrator;

#[async_trait]
impl NarrativeGenerator for TemplateNarrator {
    async fn generate(&self, task: &NarrativeTask) -> Result<String, NarrativeError> {
        let first_line = task
            .context
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("No context provided");
        Ok(format!(
            "Automated summary ({}): {}. Review the scenarios below against the listed changes.",
            task.role, first_line
        ))
    }
}
