use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use platewise_core::orchestrator::CoachConfig;

const DEFAULT_INFERENCE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_USER: &str = "default";

#[derive(Debug)]
pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub inference_url: String,
    pub user_id: String,
    pub coach: CoachConfig,
}

/// Shape of the optional `config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    inference_url: Option<String>,
    user: Option<String>,
    coach: CoachConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "platewise").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let config_path = proj_dirs.config_dir().join("config.toml");
        Self::from_parts(data_dir, &config_path, |key| std::env::var(key).ok())
    }

    /// Builds the config from a data dir, an optional TOML file and an
    /// environment lookup. Environment wins over the file.
    fn from_parts(
        data_dir: PathBuf,
        config_path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = if config_path.exists() {
            let raw = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str::<FileConfig>(&raw)
                .with_context(|| format!("Invalid config file {}", config_path.display()))?
        } else {
            FileConfig::default()
        };

        file.coach.validate()?;

        let inference_url = env("PLATEWISE_INFERENCE_URL")
            .or(file.inference_url)
            .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string());
        let user_id = env("PLATEWISE_USER")
            .or(file.user)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());

        Ok(Config {
            db_path: data_dir.join("platewise.db"),
            data_dir,
            inference_url,
            user_id,
            coach: file.coach,
        })
    }
}
