//! README section extraction.

use super::types::Documentation;

const SETUP_HEADINGS: &[&str] = &["installation", "setup", "getting started", "quick start"];
const FEATURE_HEADINGS: &[&str] = &["features", "what it does", "functionality"];
const MAX_FEATURES: usize = 10;

/// Build documentation from raw README text and optional extra documents.
pub fn from_readme(
    readme: Option<String>,
    testing_guidelines: Option<String>,
    has_docs_dir: bool,
) -> Documentation {
    let setup_instructions = readme.as_deref().and_then(extract_setup_instructions);
    let key_features = readme.as_deref().map(extract_key_features).unwrap_or_default();
    Documentation {
        readme,
        setup_instructions,
        api_documentation: has_docs_dir.then(|| "Documentation folder exists in repo".to_string()),
        key_features,
        testing_guidelines,
    }
}

/// Body of the first setup-like `##` section, trimmed.
pub fn extract_setup_instructions(readme: &str) -> Option<String> {
    SETUP_HEADINGS
        .iter()
        .find_map(|heading| section_body(readme, heading))
        .map(|body| body.trim().to_string())
        .filter(|body| !body.is_empty())
}

/// Bullet items of the first features-like `##` section.
pub fn extract_key_features(readme: &str) -> Vec<String> {
    let Some(body) = FEATURE_HEADINGS
        .iter()
        .find_map(|heading| section_body(readme, heading))
    else {
        return Vec::new();
    };

    body.lines()
        .filter_map(|line| {
            let line = line.trim_start();
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .map(|item| item.trim().to_string())
        })
        .filter(|item| !item.is_empty())
        .take(MAX_FEATURES)
        .collect()
}

/// Lines following a `## <heading>` line up to the next `##` heading.
fn section_body<'a>(readme: &'a str, heading: &str) -> Option<String> {
    let mut lines = readme.lines();
    lines.find(|line| {
        line.trim()
            .strip_prefix("## ")
            .is_some_and(|title| title.trim().to_lowercase().starts_with(heading))
    })?;

    let body: Vec<&'a str> = lines.take_while(|line| !line.trim_start().starts_with("##")).collect();
    Some(body.join("\n"))
}
