use crate::change_set::FileDiff;
use crate::report::types::{Priority, TestingScenario};

/// Emoji whose appearance in a patch suggests icon display changes.
const EMOJI_MARKERS: &[&str] = &["✅", "❌", "🟢", "🔴", "emoji"];
const NUMBER_FORMATTING_KEYWORDS: &[&str] = &["monospace", "text-align", "right", "font-family"];
const TABLE_KEYWORDS: &[&str] = &["table", "readability"];

/// When a scenario rule fires.
pub enum Trigger {
    /// Lower-cased title or description contains a keyword
    Summary(&'static [&'static str]),
    /// Some patch contains a keyword verbatim
    Patch(&'static [&'static str]),
    /// Some lower-cased patch contains a keyword
    PatchIgnoreCase(&'static [&'static str]),
    Always,
}

/// Priority given to a synthesized scenario.
#[derive(Debug, Clone, Copy)]
pub enum ScenarioPriority {
    /// The classified priority of the change set
    Classified,
    Fixed(Priority),
}

pub struct ScenarioTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub steps: &'static [&'static str],
    pub expected_outcome: &'static str,
    pub priority: ScenarioPriority,
}

impl ScenarioTemplate {
    fn instantiate(&self, classified: Priority) -> TestingScenario {
        TestingScenario {
            title: self.title.to_string(),
            description: self.description.to_string(),
            steps: self.steps.iter().map(|s| s.to_string()).collect(),
            expected_outcome: self.expected_outcome.to_string(),
            priority: match self.priority {
                ScenarioPriority::Classified => classified,
                ScenarioPriority::Fixed(priority) => priority,
            },
        }
    }
}

pub struct ScenarioRule {
    pub trigger: Trigger,
    pub template: ScenarioTemplate,
}

/// Evaluated in order; each rule adds at most one scenario.
pub const SCENARIO_RULES: &[ScenarioRule] = &[
    ScenarioRule {
        trigger: Trigger::Summary(TABLE_KEYWORDS),
        template: ScenarioTemplate {
            title: "Table Readability Verification",
            description: "Verify that table readability improvements have been implemented correctly",
            steps: &[
                "Navigate to the application (deployed URL or local setup)",
                "Find pages with tables",
                "Check if Yes/No values are displayed as emojis (✅/❌)",
                "Verify that numeric values are right-aligned and monospaced",
                "Check table formatting across different screen sizes",
                "Compare before/after readability",
            ],
            expected_outcome: "Tables display improved readability with emoji indicators and proper number formatting",
            priority: ScenarioPriority::Classified,
        },
    },
    ScenarioRule {
        trigger: Trigger::Patch(EMOJI_MARKERS),
        template: ScenarioTemplate {
            title: "Emoji Display Testing",
            description: "Test that emoji replacements for Yes/No values work correctly",
            steps: &[
                "Open the application in your browser",
                "Find sections where Yes/No values are displayed",
                "Verify Yes values show as ✅ or appropriate emoji",
                "Verify No values show as ❌ or appropriate emoji",
                "Test emoji display across different browsers",
                "Check emoji accessibility (screen readers)",
            ],
            expected_outcome: "Yes/No values are consistently displayed as appropriate emojis",
            priority: ScenarioPriority::Classified,
        },
    },
    ScenarioRule {
        trigger: Trigger::PatchIgnoreCase(NUMBER_FORMATTING_KEYWORDS),
        template: ScenarioTemplate {
            title: "Number Formatting Verification",
            description: "Test that numeric values are properly formatted for comparison",
            steps: &[
                "Access the application",
                "Navigate to sections with numeric data",
                "Verify numbers are displayed in monospace font",
                "Check that numbers are right-aligned",
                "Test with different number formats (integers, decimals, percentages)",
                "Verify alignment consistency across different data",
            ],
            expected_outcome: "Numeric values are consistently monospaced and right-aligned for easy comparison",
            priority: ScenarioPriority::Classified,
        },
    },
    ScenarioRule {
        trigger: Trigger::Always,
        template: ScenarioTemplate {
            title: "Visual Regression Testing",
            description: "Ensure UI changes don't break existing layout",
            steps: &[
                "Access the application",
                "Take screenshots of affected pages",
                "Compare with previous version if available",
                "Check for any layout breaks or misalignments",
                "Test on different screen sizes",
                "Verify no unintended style changes",
            ],
            expected_outcome: "UI changes are isolated and don't cause visual regressions",
            priority: ScenarioPriority::Fixed(Priority::Medium),
        },
    },
];

/// Used only if no rule produced a scenario.
pub const FALLBACK_SCENARIO: ScenarioTemplate = ScenarioTemplate {
    title: "Core Functionality Verification",
    description: "Verify that the main features affected by this PR work correctly",
    steps: &[
        "Access the application",
        "Identify the areas likely affected by the changes",
        "Test the primary user flows",
        "Verify no breaking changes in existing functionality",
    ],
    expected_outcome: "All core functionality works as expected without errors",
    priority: ScenarioPriority::Classified,
};

/// Turns change-set text into concrete test scenarios.
pub struct ScenarioSynthesizer<'a> {
    rules: &'a [ScenarioRule],
}

impl ScenarioSynthesizer<'static> {
    pub fn new() -> Self {
        Self {
            rules: SCENARIO_RULES,
        }
    }
}

impl<'a> ScenarioSynthesizer<'a> {
    /// Build a synthesizer over a custom rule table.
    #[allow(dead_code)]
    pub fn with_rules(rules: &'a [ScenarioRule]) -> Self {
        Self { rules }
    }

    /// Scenarios in rule order. Never empty.
    pub fn synthesize(
        &self,
        title: &str,
        description: Option<&str>,
        files: &[FileDiff],
        priority: Priority,
    ) -> Vec<TestingScenario> {
        let summary = format!("{}\n{}", title, description.unwrap_or_default()).to_lowercase();
        let patches: Vec<&str> = files.iter().filter_map(|f| f.patch.as_deref()).collect();
        let lowered: Vec<String> = patches.iter().map(|p| p.to_lowercase()).collect();

        let mut scenarios: Vec<TestingScenario> = self
            .rules
            .iter()
            .filter(|rule| match rule.trigger {
                Trigger::Summary(keywords) => keywords.iter().any(|k| summary.contains(k)),
                Trigger::Patch(keywords) => patches
                    .iter()
                    .any(|p| keywords.iter().any(|k| p.contains(k))),
                Trigger::PatchIgnoreCase(keywords) => lowered
                    .iter()
                    .any(|p| keywords.iter().any(|k| p.contains(k))),
                Trigger::Always => true,
            })
            .map(|rule| rule.template.instantiate(priority))
            .collect();

        if scenarios.is_empty() {
            scenarios.push(FALLBACK_SCENARIO.instantiate(priority));
        }
        scenarios
    }
}
