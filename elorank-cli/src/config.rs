/// Config file loading and creation for the elorank CLI.
///
/// Config lives at ~/.config/elorank/config.toml.
/// All fields are optional — CLI args override config values.
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct ElorankConfig {
    pub judge: Option<String>,
    pub criterion: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub retries: Option<usize>,
    pub comparisons: Option<usize>,
    pub prompt_template: Option<String>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# elorank configuration
# All values here can be overridden by CLI flags.

# Who decides each comparison: \"terminal\" (you) or \"llm\"
# judge = \"terminal\"

# Question asked for every pair (required by the llm judge)
# criterion = \"Which song is better?\"

# OpenAI-compatible API endpoint (llm judge)
# endpoint = \"http://localhost:8000\"

# Model ID (llm judge)
# model = \"Qwen/Qwen3-4B-Instruct-2507\"

# API key: use OPENAI_API_KEY env var or --api-key flag (not stored in config)

# LLM sampling temperature
# temperature = 0.3

# Max retries per comparison on HTTP errors
# retries = 3

# Stop after this many comparisons (required by the llm judge)
# comparisons = 50

# Path to a custom prompt template file.
# The template must contain these variables: $criterion, $option1, $option2
# prompt_template = \"/path/to/my-prompt.txt\"
";

/// Returns the default config path: ~/.config/elorank/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("elorank").join("config.toml"))
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> Result<ElorankConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ElorankConfig::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read config at {}", path.display())),
    }
}

fn parse_config(content: &str) -> Result<ElorankConfig> {
    Ok(toml::from_str(content)?)
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write config to {}", path.display()))
}
