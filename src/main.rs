mod analysis;
mod change_set;
mod config;
mod deployment;
mod narrative;
mod pipeline;
mod report;

use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

use change_set::fixture::{FixtureSource, SAMPLE_URL};
use change_set::{ChangeSetSource, GitHubClient};
use narrative::{NarrativeGenerator, OpenAiNarrator, TemplateNarrator};
use pipeline::Pipeline;
use report::{output, Format};

/// QA Context Generator: turns a GitHub pull request into a test-readiness
/// report with focus areas, testing scenarios and deployment details.
#[derive(Parser, Debug)]
#[command(name = "qa-context", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a QA report for a pull request
    Generate {
        /// GitHub Pull Request URL (e.g., https://github.com/org/repo/pull/42)
        ///
        /// Not required when --mock is used.
        pr_url: Option<String>,

        /// Output base path; each format is written as <base>.<ext>
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// markdown, html, json or all
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Skip the terminal preview
        #[arg(long)]
        no_preview: bool,

        /// Use a built-in sample PR (no GitHub or model credentials needed)
        #[arg(long)]
        r#mock: bool,
    },
    /// Show which configuration values are set
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load()?;

    match cli.command {
        Command::CheckConfig => {
            check_config(&config);
            Ok(())
        }
        Command::Generate {
            pr_url,
            output: output_base,
            format,
            no_preview,
            r#mock,
        } => {
            let formats = parse_formats(&format)?;
            let pr_url = match (pr_url, r#mock) {
                (Some(url), _) => url,
                (None, true) => SAMPLE_URL.to_string(),
                (None, false) => {
                    return Err("PR URL is required unless --mock is used. Usage: qa-context generate <URL>".into())
                }
            };
            let _span = info_span!("generate", pr_url = %pr_url).entered();

            let github;
            let openai;
            let (source, narrator): (&dyn ChangeSetSource, &dyn NarrativeGenerator) = if r#mock {
                info!("using sample PR data for demo");
                (&FixtureSource, &TemplateNarrator)
            } else {
                github = GitHubClient::new(&config.github);
                let narrator: &dyn NarrativeGenerator = match config.llm.api_key.as_deref() {
                    Some(key) => {
                        openai = OpenAiNarrator::new(&config.llm, key);
                        &openai
                    }
                    None => {
                        warn!("OPENAI_API_KEY not set; using template narrative");
                        &TemplateNarrator
                    }
                };
                (&github, narrator)
            };

            let generated = Pipeline::new(&config, source, narrator).generate(&pr_url).await?;
            for warning in &generated.warnings {
                eprintln!("{} {}", "warning:".yellow().bold(), warning);
            }

            let base = output_base.unwrap_or_else(|| {
                PathBuf::from(Utc::now().format("qa_report_%Y%m%d_%H%M%S").to_string())
            });
            let outcome = output::save_all(&generated.report, &base, &formats);
            for path in &outcome.saved {
                println!("{} {}", "Saved".green().bold(), path.display());
            }
            for (format, err) in &outcome.failed {
                eprintln!("{} {} report: {}", "Failed".red().bold(), format, err);
            }

            if !no_preview {
                output::print_terminal_summary(&generated.report);
                println!("{}", output::markdown_preview(&generated.report));
            }
            info!(priority = %generated.report.overview.priority, "done");

            if outcome.saved.is_empty() {
                return Err("no report files were written".into());
            }
            Ok(())
        }
    }
}

fn parse_formats(value: &str) -> Result<Vec<Format>, report::render::RenderError> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(Format::ALL.to_vec());
    }
    Ok(vec![value.parse()?])
}

fn check_config(config: &config::Config) {
    println!("{}", "═══ Configuration ═══".bold());
    for setting in config.check() {
        match setting.value {
            Some(value) => println!("  {} {}: {}", "✓".green(), setting.name, value),
            None => println!("  {} {}: {}", "✗".red(), setting.name, "not set".yellow()),
        }
    }
}
