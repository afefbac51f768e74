use anyhow::{Context, Result};
use apidoc_render::SiteConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "apidoc.json";

/// Top-level apidoc.json schema.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Path to the API model JSON, relative to the repo root.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    #[serde(flatten)]
    pub site: SiteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            out_dir: default_out_dir(),
            site: SiteConfig::default(),
        }
    }
}

fn default_model() -> String {
    "api.json".to_string()
}

fn default_out_dir() -> String {
    "docs/api".to_string()
}

/// Load config from an apidoc.json file, or return defaults if missing.
pub fn load_config(repo_root: &Path) -> Result<Config> {
    let config_path = repo_root.join(CONFIG_FILE);

    if config_path.exists() {
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        Ok(config)
    } else {
        tracing::debug!("{} not found, using defaults", config_path.display());
        Ok(Config::default())
    }
}

/// Walk up from the current directory to the first one holding apidoc.json.
pub fn find_repo_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    find_repo_root_from(&cwd)
}

fn find_repo_root_from(start: &Path) -> Result<PathBuf> {
    let mut dir = start;

    loop {
        if dir.join(CONFIG_FILE).exists() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => {
                anyhow::bail!(
                    "No {} found in {} or any parent directory",
                    CONFIG_FILE,
                    start.display()
                );
            }
        }
    }
}
