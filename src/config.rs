use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Top-level configuration loaded from .qa-context.toml and the environment.
///
/// All fields are optional. The value is built once and handed to the
/// pipeline by reference; nothing reads the environment after that.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub deployment: DeploymentConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token. Overridden by GITHUB_TOKEN.
    pub token: Option<String>,
    /// REST API root, for GitHub Enterprise installs
    pub api_base: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://api.github.com".to_string(),
        }
    }
}

/// OpenAI-compatible chat completions endpoint used for narrative text.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.inference.wandb.ai/v1".to_string(),
            model: "meta-llama/Llama-3.1-8B-Instruct".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Comments expected before deployment links are searched without waiting
    pub min_comments: usize,
    /// Pause before re-fetching comments
    pub wait_secs: u64,
    /// Number of re-fetches while evidence is below `min_comments`
    pub max_retries: usize,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            min_comments: 2,
            wait_secs: 60,
            max_retries: 1,
        }
    }
}

impl DeploymentConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Estimated testing window shown in the overview
    pub testing_window: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            testing_window: "30-60 minutes".to_string(),
        }
    }
}

/// One line of the `check-config` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingStatus {
    pub name: &'static str,
    /// Display value, masked for secrets. None when the setting is missing.
    pub value: Option<String>,
}

impl Config {
    /// Load configuration from .qa-context.toml in the current directory,
    /// then apply environment overrides.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(".qa-context.toml");
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load from a specific path without environment overrides.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(token) = lookup("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(model) = lookup("MODEL_NAME") {
            self.llm.model = model;
        }
        if let Some(value) = lookup("MIN_COMMENTS_FOR_DEPLOYMENT") {
            self.deployment.min_comments = parse_env("MIN_COMMENTS_FOR_DEPLOYMENT", value)?;
        }
        if let Some(value) = lookup("DEPLOYMENT_WAIT_SECS") {
            self.deployment.wait_secs = parse_env("DEPLOYMENT_WAIT_SECS", value)?;
        }
        Ok(())
    }

    /// Report which settings are present, masking secrets.
    pub fn check(&self) -> Vec<SettingStatus> {
        vec![
            SettingStatus {
                name: "GITHUB_TOKEN",
                value: self.github.token.as_deref().map(mask_secret),
            },
            SettingStatus {
                name: "OPENAI_API_KEY",
                value: self.llm.api_key.as_deref().map(mask_secret),
            },
            SettingStatus {
                name: "OPENAI_BASE_URL",
                value: Some(self.llm.base_url.clone()),
            },
            SettingStatus {
                name: "MODEL_NAME",
                value: Some(self.llm.model.clone()),
            },
            SettingStatus {
                name: "MIN_COMMENTS_FOR_DEPLOYMENT",
                value: Some(self.deployment.min_comments.to_string()),
            },
            SettingStatus {
                name: "DEPLOYMENT_WAIT_SECS",
                value: Some(self.deployment.wait_secs.to_string()),
            },
        ]
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "***".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{}", tail)
}
