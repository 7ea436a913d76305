use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "score-manager.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Overridden by `DATABASE_URL` when set.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Emails admitted after sign-in.
    #[serde(default)]
    pub allowed_emails: Vec<String>,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfConfig {
    /// TrueType font embedded into PDF exports. Without it only the builtin
    /// WinAnsi fonts are available and non-Latin text is refused.
    #[serde(default)]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

fn default_chart_width() -> u32 {
    800
}

fn default_chart_height() -> u32 {
    480
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("invalid config in {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Config::default()
        };

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = Some(url);
        }

        Ok(config)
    }
}
