use colored::Colorize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::render::{self, Format, RenderError};
use super::types::{Priority, QaReport};

const PREVIEW_LINES: usize = 50;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of writing several formats. A failed format does not stop the
/// others.
#[derive(Debug, Default)]
pub struct SaveOutcome {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<(Format, OutputError)>,
}

/// `<base>.<ext>` for the given format.
pub fn output_path(base: &Path, format: Format) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

/// Render and write one format, overwriting any existing file.
pub fn save(report: &QaReport, base: &Path, format: Format) -> Result<PathBuf, OutputError> {
    let content = render::render(report, format)?;
    let path = output_path(base, format);
    std::fs::write(&path, content).map_err(|source| OutputError::FileWrite {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[instrument(skip(report, formats), fields(base = %base.display()))]
pub fn save_all(report: &QaReport, base: &Path, formats: &[Format]) -> SaveOutcome {
    let mut outcome = SaveOutcome::default();
    for &format in formats {
        match save(report, base, format) {
            Ok(path) => {
                debug!(%format, path = %path.display(), "saved report");
                outcome.saved.push(path);
            }
            Err(err) => {
                warn!(%format, error = %err, "failed to save report");
                outcome.failed.push((format, err));
            }
        }
    }
    outcome
}

/// Print a colored summary of the report to the terminal.
pub fn print_terminal_summary(report: &QaReport) {
    let overview = &report.overview;
    println!();
    println!("{}", "═══ QA Context Generated ═══".bold());
    println!("Feature: {}", overview.feature);
    println!("Priority: {}", colorize_priority(overview.priority));
    println!(
        "Files changed: {} | Lines changed: {} | Testing window: {}",
        overview.files_changed, overview.lines_changed, overview.testing_window
    );
    println!();

    println!("{}", "═══ Deployment ═══".bold());
    match (&report.deployment.url, report.deployment.provider) {
        (Some(url), Some(provider)) => println!("  Live URL: {} ({})", url.cyan(), provider),
        (Some(url), None) => println!("  Live URL: {}", url.cyan()),
        (None, _) => println!("  {}", "Waiting for deployment...".yellow()),
    }
    println!();

    println!("{}", "═══ Focus Areas ═══".bold());
    for area in &report.primary_focus_areas {
        println!("  • {}", area);
    }
    println!();

    println!("{}", "═══ Testing Scenarios ═══".bold());
    for (i, scenario) in report.testing_scenarios.iter().enumerate() {
        println!("  {}. {} [{}]", i + 1, scenario.title, colorize_priority(scenario.priority));
    }
    println!();
}

/// First lines of the markdown rendering, with a line count if truncated.
pub fn markdown_preview(report: &QaReport) -> String {
    let md = render::markdown(report);
    let lines: Vec<&str> = md.lines().collect();
    if lines.len() <= PREVIEW_LINES {
        return md;
    }
    let mut preview = lines[..PREVIEW_LINES].join("\n");
    preview.push_str(&format!("\n...\n[Total lines: {}]", lines.len()));
    preview
}

fn colorize_priority(priority: Priority) -> colored::ColoredString {
    match priority {
        Priority::High => "HIGH".red().bold(),
        Priority::Medium => "MEDIUM".yellow().bold(),
        Priority::Low => "LOW".green().bold(),
    }
}
