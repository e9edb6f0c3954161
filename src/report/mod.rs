pub mod output;
pub mod render;
pub mod types;

pub use render::Format;
pub use types::{Overview, Priority, QaReport};

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::analysis::Analysis;
use crate::change_set::{ChangeSet, Documentation};
use crate::deployment::DeploymentStatus;

pub const SETUP_INSTRUCTIONS: &str = "Setup Instructions";
pub const TESTING_GUIDELINES: &str = "Testing Guidelines";
pub const PULL_REQUEST: &str = "Pull Request";

/// Everything the assembler combines into one report.
pub struct ReportInputs<'a> {
    pub change_set: &'a ChangeSet,
    pub analysis: Analysis,
    pub deployment: DeploymentStatus,
    pub documentation: &'a Documentation,
    /// Generated prose, inserted as-is
    pub narrative: Option<String>,
    pub testing_window: &'a str,
    pub generated_at: DateTime<Utc>,
}

/// Build the QA report. Upstream values are copied, never modified.
#[instrument(skip(inputs), fields(change_set = %inputs.change_set.reference))]
pub fn assemble(inputs: ReportInputs<'_>) -> QaReport {
    let ReportInputs {
        change_set,
        analysis,
        deployment,
        documentation,
        narrative,
        testing_window,
        generated_at,
    } = inputs;

    let additional_resources = additional_resources(&deployment, documentation, &change_set.url());
    let application_context = application_context(change_set, documentation, narrative.as_deref());
    debug!(
        resources = additional_resources.len(),
        context_bytes = application_context.len(),
        "assembled report sections"
    );

    QaReport {
        overview: Overview {
            feature: change_set.title.clone(),
            priority: analysis.priority,
            files_changed: change_set.files_changed(),
            lines_changed: change_set.lines_changed(),
            testing_window: testing_window.to_string(),
        },
        primary_focus_areas: analysis.focus_areas,
        testing_scenarios: analysis.scenarios,
        application_context,
        deployment,
        additional_resources,
        generated_at,
    }
}

/// Setup instructions only matter when there is no live deployment to test
/// against. Guidelines and the pull request link are always included.
pub fn additional_resources(
    deployment: &DeploymentStatus,
    documentation: &Documentation,
    pr_url: &str,
) -> BTreeMap<String, String> {
    let mut resources = BTreeMap::new();
    if deployment.url.is_none() {
        if let Some(setup) = documentation.setup_instructions.as_deref().filter(|s| !s.is_empty()) {
            resources.insert(SETUP_INSTRUCTIONS.to_string(), setup.to_string());
        }
    }
    if let Some(guidelines) = documentation.testing_guidelines.as_deref().filter(|s| !s.is_empty()) {
        resources.insert(TESTING_GUIDELINES.to_string(), guidelines.to_string());
    }
    if !pr_url.is_empty() {
        resources.insert(PULL_REQUEST.to_string(), pr_url.to_string());
    }
    resources
}

/// First line that is neither blank nor a heading.
pub fn readme_summary(readme: &str) -> Option<&str> {
    readme
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Paragraphs describing the application and the change, separated by blank
/// lines. Paragraphs with no source data are left out.
pub fn application_context(
    change_set: &ChangeSet,
    documentation: &Documentation,
    narrative: Option<&str>,
) -> String {
    let mut parts = vec![format!(
        "**Repository:** {}/{}",
        change_set.reference.owner, change_set.reference.repo
    )];

    if let Some(summary) = documentation.readme.as_deref().and_then(readme_summary) {
        parts.push(format!("**Application Summary:** {}", summary));
    }
    if let Some(diff_summary) = change_set.diff_summary.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("**Changes Made:** {}", diff_summary));
    }
    if !change_set.comments.is_empty() {
        let bodies: Vec<&str> = change_set.comments.iter().map(|c| c.body.as_str()).collect();
        parts.push(format!("**PR Comments:** {}", bodies.join("; ")));
    }
    parts.push(format!("**Files Modified:** {} files", change_set.files_changed()));
    parts.push(format!(
        "**Change Size:** {} additions, {} deletions",
        change_set.additions, change_set.deletions
    ));
    if !change_set.labels.is_empty() {
        parts.push(format!("**Labels:** {}", change_set.labels.join(", ")));
    }
    if let Some(narrative) = narrative.filter(|n| !n.trim().is_empty()) {
        parts.push(format!("**QA Analysis:** {}", narrative));
    }

    parts.join("\n\n")
}
