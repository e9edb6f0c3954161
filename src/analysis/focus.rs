use crate::change_set::diff::{changed_lines, ChangedLine};
use crate::change_set::ChangeSet;

/// Returned when no rule fires, so the focus-area list is never empty.
pub const DEFAULT_FOCUS_AREA: &str = "User Interface Changes";

/// A keyword group: any keyword present marks the focus area.
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub area: &'static str,
}

impl KeywordRule {
    fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|k| haystack.contains(k))
    }
}

/// Tested against each lower-cased patch, in this order.
pub const PATCH_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["emoji", "✅", "❌", "🟢", "🔴"],
        area: "Emoji/Icon Display",
    },
    KeywordRule {
        keywords: &["align", "text-align", "monospace", "font-family"],
        area: "Text Formatting and Alignment",
    },
    KeywordRule {
        keywords: &["table", "<th", "<td", "<tr"],
        area: "Table Display and Readability",
    },
    KeywordRule {
        keywords: &["yes", "no", "true", "false"],
        area: "Boolean Value Display",
    },
    KeywordRule {
        keywords: &["number", "digit", "numeric", "monospace", "align-right", "tabular-nums"],
        area: "Numeric Value Display",
    },
    KeywordRule {
        keywords: &["css", "style", "class"],
        area: "Visual Styling Changes",
    },
    KeywordRule {
        keywords: &["responsive", "mobile", "width"],
        area: "Responsive Design",
    },
];

/// Tested against the lower-cased title and description.
pub const SUMMARY_RULES: &[KeywordRule] = &[KeywordRule {
    keywords: &["table", "readability"],
    area: "Table Display and Readability",
}];

/// UI indicators win over style indicators for the same filename.
pub const FILENAME_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["component", "ui", "view", "page", "template"],
        area: "User Interface Changes",
    },
    KeywordRule {
        keywords: &["css", "scss", "style"],
        area: "Visual Styling Changes",
    },
];

/// Output of the diff analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusAnalysis {
    /// Never empty, no duplicates, first-detected order
    pub focus_areas: Vec<String>,
    /// Per-file ADDED/REMOVED listing for narrative prompts
    pub specific_changes: String,
}

/// Infers affected functional and visual areas from diff content.
#[derive(Debug, Default)]
pub struct DiffAnalyzer;

impl DiffAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, change_set: &ChangeSet) -> FocusAnalysis {
        FocusAnalysis {
            focus_areas: self.focus_areas(change_set),
            specific_changes: self.specific_changes(change_set),
        }
    }

    pub fn focus_areas(&self, change_set: &ChangeSet) -> Vec<String> {
        let mut areas: Vec<&'static str> = Vec::new();
        let mut push = |area: &'static str| {
            if !areas.contains(&area) {
                areas.push(area);
            }
        };

        let summary = format!(
            "{}\n{}",
            change_set.title,
            change_set.description.as_deref().unwrap_or_default()
        )
        .to_lowercase();
        SUMMARY_RULES
            .iter()
            .filter(|rule| rule.matches(&summary))
            .for_each(|rule| push(rule.area));

        for file in &change_set.files {
            if let Some(patch) = file.patch.as_deref() {
                let patch = patch.to_lowercase();
                PATCH_RULES
                    .iter()
                    .filter(|rule| rule.matches(&patch))
                    .for_each(|rule| push(rule.area));
            }

            let filename = file.filename.to_lowercase();
            if let Some(rule) = FILENAME_RULES.iter().find(|rule| rule.matches(&filename)) {
                push(rule.area);
            }
        }

        if areas.is_empty() {
            areas.push(DEFAULT_FOCUS_AREA);
        }
        areas.into_iter().map(str::to_string).collect()
    }

    /// Render added and removed lines per file, preserving file order and
    /// line order within each file.
    pub fn specific_changes(&self, change_set: &ChangeSet) -> String {
        let mut out = Vec::new();
        for file in &change_set.files {
            out.push(format!("\n📁 File: {}", file.filename));
            out.push(format!("   Status: {}", file.status));
            out.push(format!("   Changes: +{} -{} lines", file.additions, file.deletions));

            let Some(patch) = file.patch.as_deref() else {
                continue;
            };
            out.push("   Code changes:".to_string());
            for line in changed_lines(patch) {
                match line {
                    ChangedLine::Added(text) => out.push(format!("     ADDED: {}", text.trim())),
                    ChangedLine::Removed(text) => out.push(format!("     REMOVED: {}", text.trim())),
                }
            }
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_set::tests::{test_change_set, test_file_diff};

    #[test]
    fn test_no_files_defaults_to_ui_changes() {
        let areas = DiffAnalyzer::new().focus_areas(&test_change_set());
        assert_eq!(areas, vec![DEFAULT_FOCUS_AREA.to_string()]);
    }

    #[test]
    fn test_patch_rules_fire_independently() {
        let mut cs = test_change_set();
        cs.files = vec![test_file_diff(
            "src/lib.rs",
            Some("+ let emoji = \"🟢\";\n+ max-width: 100%"),
        )];
        let areas = DiffAnalyzer::new().focus_areas(&cs);
        assert!(areas.contains(&"Emoji/Icon Display".to_string()));
        assert!(areas.contains(&"Responsive Design".to_string()));
        assert!(!areas.contains(&"Table Display and Readability".to_string()));
    }

    #[test]
    fn test_areas_are_deduplicated_across_files() {
        let mut cs = test_change_set();
        cs.files = vec![
            test_file_diff("a.rs", Some("+ .button { style }")),
            test_file_diff("b.rs", Some("+ class=\"x\"")),
            test_file_diff("theme.scss", None),
        ];
        let areas = DiffAnalyzer::new().focus_areas(&cs);
        let styling = areas.iter().filter(|a| *a == "Visual Styling Changes").count();
        assert_eq!(styling, 1);
        let mut sorted = areas.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), areas.len());
    }

    #[test]
    fn test_filename_indicators_without_patch() {
        let mut cs = test_change_set();
        cs.files = vec![test_file_diff("src/components/Header.tsx", None)];
        assert_eq!(
            DiffAnalyzer::new().focus_areas(&cs),
            vec!["User Interface Changes".to_string()]
        );

        cs.files = vec![test_file_diff("assets/main.scss", None)];
        assert_eq!(
            DiffAnalyzer::new().focus_areas(&cs),
            vec!["Visual Styling Changes".to_string()]
        );
    }

    #[test]
    fn test_title_mentions_table() {
        let mut cs = test_change_set();
        cs.title = "Improve Table readability".to_string();
        let areas = DiffAnalyzer::new().focus_areas(&cs);
        assert_eq!(areas, vec!["Table Display and Readability".to_string()]);
    }

    #[test]
    fn test_specific_changes_block() {
        let mut cs = test_change_set();
        cs.files = vec![
            test_file_diff("a.css", Some("@@ -1 +1 @@\n-  color: red;\n+  color: blue;\n context")),
            test_file_diff("logo.png", None),
        ];
        let block = DiffAnalyzer::new().specific_changes(&cs);
        assert_eq!(
            block,
            "\n📁 File: a.css\n   Status: modified\n   Changes: +1 -1 lines\n   Code changes:\n     REMOVED: color: red;\n     ADDED: color: blue;\n\n📁 File: logo.png\n   Status: modified\n   Changes: +0 -0 lines"
        );
    }
}
