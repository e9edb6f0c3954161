use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::analysis::{self, Analysis};
use crate::change_set::{self, ChangeSet, ChangeSetError, ChangeSetRef, ChangeSetSource, Documentation};
use crate::config::Config;
use crate::deployment::{DeploymentStatus, DeploymentWatcher};
use crate::narrative::{NarrativeGenerator, NarrativeTask};
use crate::report::{self, QaReport, ReportInputs};

/// Failures that abort report generation. No partial report is produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidReference(ChangeSetError),

    #[error("Failed to collect pull request data: {0}")]
    Collection(#[source] ChangeSetError),
}

/// Degraded branches that fell back to a default value.
#[derive(Debug, Error)]
pub enum PipelineWarning {
    #[error("deployment discovery degraded, assuming pending: {0}")]
    DeploymentDegraded(String),

    #[error("documentation unavailable: {0}")]
    DocumentationDegraded(String),

    #[error("narrative generation failed, report has no QA analysis: {0}")]
    NarrativeDegraded(String),
}

/// A report plus the warnings raised while building it.
#[derive(Debug)]
pub struct Generated {
    pub report: QaReport,
    pub warnings: Vec<PipelineWarning>,
}

/// Runs collection, analysis, deployment discovery, narrative generation
/// and assembly for one change set at a time. Holds no state between runs.
pub struct Pipeline<'a> {
    config: &'a Config,
    source: &'a dyn ChangeSetSource,
    narrator: &'a dyn NarrativeGenerator,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        source: &'a dyn ChangeSetSource,
        narrator: &'a dyn NarrativeGenerator,
    ) -> Self {
        Self {
            config,
            source,
            narrator,
        }
    }

    pub async fn generate(&self, url: &str) -> Result<Generated, PipelineError> {
        let reference = change_set::parse_change_set_url(url).map_err(PipelineError::InvalidReference)?;
        self.generate_for(&reference).await
    }

    #[instrument(skip(self, reference), fields(change_set = %reference))]
    pub async fn generate_for(&self, reference: &ChangeSetRef) -> Result<Generated, PipelineError> {
        let mut warnings = Vec::new();

        info!("collecting pull request data");
        let change_set = self
            .source
            .fetch_change_set(reference)
            .await
            .map_err(PipelineError::Collection)?;
        info!(
            files = change_set.files_changed(),
            additions = change_set.additions,
            deletions = change_set.deletions,
            "collected pull request"
        );

        let analysis = analysis::run_all(&change_set);
        info!(priority = %analysis.priority, scenarios = analysis.scenarios.len(), "analysis complete");

        let watcher = DeploymentWatcher::new(self.source, &self.config.deployment);
        let (deployment, documentation) = tokio::join!(
            watcher.watch(reference, change_set.comments.clone()),
            self.source.fetch_documentation(&reference.owner, &reference.repo),
        );

        let deployment = deployment.unwrap_or_else(|err| {
            warn!(error = %err, "deployment discovery failed");
            warnings.push(PipelineWarning::DeploymentDegraded(err.to_string()));
            DeploymentStatus::default()
        });
        info!(status = %deployment.status, url = ?deployment.url, "deployment resolved");

        let documentation = documentation.unwrap_or_else(|err| {
            warn!(error = %err, "documentation fetch failed");
            warnings.push(PipelineWarning::DocumentationDegraded(err.to_string()));
            Documentation::default()
        });

        let task = qa_analysis_task(&change_set, &documentation, &analysis);
        let narrative = match self.narrator.generate(&task).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(error = %err, "narrative generation failed");
                warnings.push(PipelineWarning::NarrativeDegraded(err.to_string()));
                None
            }
        };

        let report = report::assemble(ReportInputs {
            change_set: &change_set,
            analysis,
            deployment,
            documentation: &documentation,
            narrative,
            testing_window: &self.config.report.testing_window,
            generated_at: Utc::now(),
        });

        Ok(Generated { report, warnings })
    }
}

/// Build the narrative request describing what changed and what to test.
pub fn qa_analysis_task(
    change_set: &ChangeSet,
    documentation: &Documentation,
    analysis: &Analysis,
) -> NarrativeTask {
    let none_if_empty = |items: String, fallback: &str| {
        if items.is_empty() {
            fallback.to_string()
        } else {
            items
        }
    };

    let comments = none_if_empty(
        change_set
            .comments
            .iter()
            .map(|c| format!("{}: {}", c.author, c.body))
            .collect::<Vec<_>>()
            .join("\n"),
        "No comments",
    );
    let files = change_set.filenames().collect::<Vec<_>>().join(", ");
    let labels = none_if_empty(change_set.labels.join(", "), "None");
    let features = none_if_empty(documentation.key_features.join(", "), "Unknown");

    let context = format!(
        "PR Title: {}\nPR Description: {}\nCommits: {}\nOpened: {}\nLast Updated: {}\n\nSPECIFIC CHANGES MADE:\n{}\n\nPR Comments:\n{}\n\nFiles Changed: {}\nLabels: {}\nRepository Features: {}\nAPI Documentation: {}\nDetected Focus Areas: {}",
        change_set.title,
        change_set.description.as_deref().unwrap_or("No description provided"),
        change_set.commits,
        change_set.created_at.format("%Y-%m-%d %H:%M UTC"),
        change_set.updated_at.format("%Y-%m-%d %H:%M UTC"),
        analysis.specific_changes,
        comments,
        files,
        labels,
        features,
        documentation.api_documentation.as_deref().unwrap_or("None"),
        analysis.focus_areas.join(", "),
    );

    NarrativeTask {
        role: "QA Context Generator".to_string(),
        instructions: "Analyze the pull request below and explain, for a QA tester, what specific \
                       functionality changed, which UI elements were modified, which user behaviors \
                       need testing, and how to prioritize them. Be specific about the actual code \
                       changes, not generic."
            .to_string(),
        context,
    }
}
