use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

use super::types::QaReport;
use super::PULL_REQUEST;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Unsupported format: {0} (expected markdown, html or json)")]
    UnsupportedFormat(String),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Html,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Markdown, Format::Html, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Markdown => "md",
            Format::Html => "html",
            Format::Json => "json",
        }
    }
}

impl FromStr for Format {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Format::Markdown),
            "html" => Ok(Format::Html),
            "json" => Ok(Format::Json),
            _ => Err(RenderError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Markdown => write!(f, "markdown"),
            Format::Html => write!(f, "html"),
            Format::Json => write!(f, "json"),
        }
    }
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d at %H:%M:%S UTC";

/// Render a report. Same report in, same bytes out.
pub fn render(report: &QaReport, format: Format) -> Result<String, RenderError> {
    match format {
        Format::Markdown => Ok(markdown(report)),
        Format::Html => Ok(html(report)),
        Format::Json => json(report),
    }
}

pub fn markdown(report: &QaReport) -> String {
    let mut md = String::new();

    md.push_str("# 🧪 QA Testing Context Report\n\n");
    let _ = writeln!(md, "*Generated on {}*\n", report.generated_at.format(TIMESTAMP_FORMAT));

    let overview = &report.overview;
    md.push_str("## 📋 Overview\n\n");
    let _ = writeln!(md, "- **Feature:** {}", overview.feature);
    let _ = writeln!(md, "- **Priority:** {} {}", overview.priority.marker(), overview.priority);
    let _ = writeln!(md, "- **Files Changed:** {}", overview.files_changed);
    let _ = writeln!(md, "- **Lines Changed:** {}", overview.lines_changed);
    let _ = writeln!(md, "- **Estimated Testing Time:** {}\n", overview.testing_window);

    let deployment = &report.deployment;
    md.push_str("## 🚀 Deployment Information\n\n");
    match deployment.url.as_deref() {
        Some(url) => {
            let _ = writeln!(md, "- **Live URL:** [{url}]({url})");
            let _ = writeln!(md, "- **Status:** {}", deployment.status);
            if let Some(provider) = deployment.provider {
                let _ = writeln!(md, "- **Provider:** {}", provider);
            }
            if let Some(at) = deployment.discovered_at {
                let _ = writeln!(md, "- **Deployed:** {}", at.format(TIMESTAMP_FORMAT));
            }
            md.push_str("\n**✅ Ready for testing! Use the live URL above.**\n\n");
        }
        None => {
            md.push_str("- **Live URL:** ⏳ *Waiting for deployment...*\n");
            let _ = writeln!(md, "- **Status:** {}", deployment.status);
            md.push_str("\n**⚠️ No deployment URL available yet. Use local setup for testing.**\n\n");
        }
    }

    if !report.primary_focus_areas.is_empty() {
        md.push_str("## 🎯 Primary Focus Areas\n\n");
        for area in &report.primary_focus_areas {
            let _ = writeln!(md, "- **{}**", area);
        }
        md.push('\n');
    }

    if !report.testing_scenarios.is_empty() {
        md.push_str("## 🔍 Testing Scenarios\n\n");
        for (i, scenario) in report.testing_scenarios.iter().enumerate() {
            let _ = writeln!(md, "### {}. {} {}\n", i + 1, scenario.title, scenario.priority.marker());
            let _ = writeln!(md, "**Description:** {}\n", scenario.description);
            md.push_str("**Steps:**\n");
            for (n, step) in scenario.steps.iter().enumerate() {
                let _ = writeln!(md, "{}. {}", n + 1, step);
            }
            let _ = writeln!(md, "\n**Expected Outcome:** {}\n", scenario.expected_outcome);
            let _ = writeln!(md, "**Priority:** {}\n", scenario.priority);
            md.push_str("---\n\n");
        }
    }

    if !report.application_context.is_empty() {
        md.push_str("## 📱 Application Context\n\n");
        md.push_str(&report.application_context);
        md.push_str("\n\n");
    }

    if !report.additional_resources.is_empty() {
        md.push_str("## 📚 Additional Resources\n\n");
        for (name, content) in &report.additional_resources {
            if content.starts_with("http") {
                let _ = writeln!(md, "- **{name}:** [{content}]({content})");
            } else {
                let _ = writeln!(md, "- **{name}:** {content}");
            }
        }
        md.push('\n');
    }

    let pr_link = report
        .additional_resources
        .get(PULL_REQUEST)
        .map(String::as_str)
        .unwrap_or("#");
    md.push_str("---\n\n");
    md.push_str("*This report was generated automatically by the QA Context Generator.*\n");
    let _ = write!(
        md,
        "*For questions or issues, please refer to the [Pull Request]({pr_link}).*"
    );

    md
}

/// Wrap the markdown verbatim in a static HTML shell.
pub fn html(report: &QaReport) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>QA Testing Context Report</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; }}
        .container {{ max-width: 800px; margin: 0 auto; padding: 20px; }}
        .priority-high {{ color: #d73a49; }}
        .priority-medium {{ color: #f66a0a; }}
        .priority-low {{ color: #28a745; }}
        pre {{ background: #f6f8fa; padding: 10px; border-radius: 5px; overflow-x: auto; }}
        code {{ background: #f3f4f6; padding: 2px 4px; border-radius: 3px; }}
    </style>
</head>
<body>
    <div class="container">
        <div id="markdown-content">
{}
        </div>
    </div>
</body>
</html>
"#,
        escape_html(&markdown(report))
    )
}

/// Escape text for embedding in an HTML element body.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Field-for-field JSON with RFC 3339 timestamps.
pub fn json(report: &QaReport) -> Result<String, RenderError> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::{DeploymentState, DeploymentStatus, Provider};
    use crate::report::tests::{generated_at, sample_report};

    #[test]
    fn test_format_from_str() {
        assert_eq!("Markdown".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!("html".parse::<Format>().unwrap(), Format::Html);
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert!(matches!("pdf".parse::<Format>(), Err(RenderError::UnsupportedFormat(f)) if f == "pdf"));
        assert_eq!(Format::Markdown.extension(), "md");
    }

    #[test]
    fn test_markdown_is_deterministic() {
        let report = sample_report();
        assert_eq!(markdown(&report), markdown(&report));
        assert_eq!(markdown(&report), markdown(&report.clone()));
    }

    #[test]
    fn test_markdown_section_order() {
        let md = markdown(&sample_report());
        let sections = [
            "# 🧪 QA Testing Context Report",
            "*Generated on 2024-05-02 at 14:05:09 UTC*",
            "## 📋 Overview",
            "## 🚀 Deployment Information",
            "## 🎯 Primary Focus Areas",
            "## 🔍 Testing Scenarios",
            "## 📱 Application Context",
            "## 📚 Additional Resources",
            "*This report was generated automatically",
        ];
        let positions: Vec<usize> = sections
            .iter()
            .map(|s| md.find(s).unwrap_or_else(|| panic!("missing {s}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_markdown_overview_and_scenarios() {
        let md = markdown(&sample_report());
        assert!(md.contains("- **Priority:** 🟡 Medium\n"));
        assert!(md.contains("- **Lines Changed:** 90\n"));
        assert!(md.contains("### 1. Table Readability Verification 🟡\n"));
        assert!(md.contains("### 4. Visual Regression Testing 🟡\n"));
        assert!(md.contains("**Steps:**\n1. Navigate to the application"));
        assert_eq!(md.matches("\n---\n").count(), 5);
    }

    #[test]
    fn test_markdown_waiting_branch() {
        let md = markdown(&sample_report());
        assert!(md.contains("⏳ *Waiting for deployment...*"));
        assert!(md.contains("- **Status:** pending"));
        assert!(!md.contains("Ready for testing"));
        assert!(md.contains("- **Setup Instructions:** npm install && npm start"));
    }

    #[test]
    fn test_markdown_live_branch() {
        let mut report = sample_report();
        report.deployment = DeploymentStatus {
            url: Some("https://pr7.fly.dev".to_string()),
            status: DeploymentState::Deployed,
            provider: Some(Provider::FlyIo),
            discovered_at: Some(generated_at()),
        };
        let md = markdown(&report);
        assert!(md.contains("- **Live URL:** [https://pr7.fly.dev](https://pr7.fly.dev)"));
        assert!(md.contains("- **Provider:** fly.io"));
        assert!(md.contains("- **Deployed:** 2024-05-02 at 14:05:09 UTC"));
        assert!(!md.contains("Waiting for deployment"));
    }

    #[test]
    fn test_resources_as_links_and_footer() {
        let md = markdown(&sample_report());
        assert!(md.contains(
            "- **Pull Request:** [https://github.com/org/webapp/pull/7](https://github.com/org/webapp/pull/7)"
        ));
        assert!(md.contains("- **Testing Guidelines:** Run npm test"));
        assert!(md.ends_with("[Pull Request](https://github.com/org/webapp/pull/7).*"));
    }

    #[test]
    fn test_footer_placeholder_without_pull_request() {
        let mut report = sample_report();
        report.additional_resources.clear();
        let md = markdown(&report);
        assert!(!md.contains("## 📚 Additional Resources"));
        assert!(md.ends_with("[Pull Request](#).*"));
    }

    #[test]
    fn test_html_wraps_escaped_markdown() {
        let report = sample_report();
        let page = html(&report);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<style>"));
        assert!(page.contains(&escape_html(&markdown(&report))));
    }

    #[test]
    fn test_html_escapes_markup_from_report_text() {
        let mut report = sample_report();
        report.application_context = "Changed <td class=\"numeric\"> & </table>".to_string();
        let page = html(&report);
        assert!(page.contains("Changed &lt;td class=\"numeric\"&gt; &amp; &lt;/table&gt;"));
        assert!(!page.contains("<td class="));
        assert!(page.contains("</body>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_html("✅ plain"), "✅ plain");
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample_report();
        let text = json(&report).unwrap();
        let parsed: QaReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, report);
        assert!(text.contains("\"generated_at\": \"2024-05-02T14:05:09Z\""));
        assert!(text.contains("\"status\": \"pending\""));
    }

    #[test]
    fn test_json_key_order_is_stable() {
        let text = json(&sample_report()).unwrap();
        let keys = [
            "\"overview\"",
            "\"primary_focus_areas\"",
            "\"testing_scenarios\"",
            "\"application_context\"",
            "\"deployment\"",
            "\"additional_resources\"",
            "\"generated_at\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
