pub mod focus;
pub mod priority;
pub mod scenarios;

use tracing::{debug, info_span};

use crate::change_set::ChangeSet;
use crate::report::types::{Priority, TestingScenario};
use focus::DiffAnalyzer;
use scenarios::ScenarioSynthesizer;

/// Everything derived from the diff and metadata of one change set.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub priority: Priority,
    pub focus_areas: Vec<String>,
    pub specific_changes: String,
    pub scenarios: Vec<TestingScenario>,
}

/// Run diff analysis, priority classification and scenario synthesis.
pub fn run_all(change_set: &ChangeSet) -> Analysis {
    let _span = info_span!("analyze", change_set = %change_set.reference).entered();

    let focus = DiffAnalyzer::new().analyze(change_set);
    debug!(areas = ?focus.focus_areas, "focus areas");

    let priority = priority::classify(change_set.lines_changed(), &change_set.labels);
    debug!(%priority, lines_changed = change_set.lines_changed(), "classified priority");

    let scenarios = ScenarioSynthesizer::new().synthesize(
        &change_set.title,
        change_set.description.as_deref(),
        &change_set.files,
        priority,
    );
    debug!(scenarios = scenarios.len(), "synthesized scenarios");

    Analysis {
        priority,
        focus_areas: focus.focus_areas,
        specific_changes: focus.specific_changes,
        scenarios,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_set::tests::{test_change_set, test_file_diff};

    #[test]
    fn test_table_readability_change_set() {
        let mut cs = test_change_set();
        cs.title = "Improve table readability".to_string();
        cs.additions = 80;
        cs.deletions = 10;
        cs.files = vec![test_file_diff("Report.tsx", Some("+ align-right monospace\n+ ✅"))];

        let analysis = run_all(&cs);
        assert_eq!(analysis.priority, Priority::Medium);
        for area in [
            "Table Display and Readability",
            "Numeric Value Display",
            "Emoji/Icon Display",
        ] {
            assert!(analysis.focus_areas.iter().any(|a| a == area), "missing {area}");
        }
        let titles: Vec<&str> = analysis.scenarios.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Table Readability Verification",
                "Emoji Display Testing",
                "Number Formatting Verification",
                "Visual Regression Testing",
            ]
        );
        assert!(analysis.specific_changes.contains("ADDED: align-right monospace"));
    }

    #[test]
    fn test_empty_change_set() {
        let analysis = run_all(&test_change_set());
        assert_eq!(analysis.priority, Priority::Low);
        assert_eq!(analysis.focus_areas, vec!["User Interface Changes".to_string()]);
        assert_eq!(analysis.scenarios.len(), 1);
        assert!(analysis.specific_changes.is_empty());
    }
}
