use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::deployment::DeploymentStatus;

/// Testing priority for a scenario or a whole change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Colored circle shown next to the priority in markdown.
    pub fn marker(self) -> &'static str {
        match self {
            Priority::High => "🔴",
            Priority::Medium => "🟡",
            Priority::Low => "🟢",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

/// A concrete manual test a QA engineer should run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestingScenario {
    pub title: String,
    pub description: String,
    /// Ordered, never empty
    pub steps: Vec<String>,
    pub expected_outcome: String,
    pub priority: Priority,
}

/// Headline numbers for the change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub feature: String,
    pub priority: Priority,
    pub files_changed: usize,
    pub lines_changed: usize,
    pub testing_window: String,
}

/// Complete QA test-readiness report. Built once by the assembler and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaReport {
    pub overview: Overview,
    /// Deduplicated, in first-detected order
    pub primary_focus_areas: Vec<String>,
    pub testing_scenarios: Vec<TestingScenario>,
    pub application_context: String,
    pub deployment: DeploymentStatus,
    /// Resource name to a URL or inline text
    pub additional_resources: BTreeMap<String, String>,
    pub generated_at: DateTime<Utc>,
}
