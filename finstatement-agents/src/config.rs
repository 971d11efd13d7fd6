use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::gemini::{DEFAULT_TIMEOUT_SECS, GEMINI_API_BASE_URL};

pub const ENV_PREFIX: &str = "FINSTATEMENT";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AgentsConfig {
    pub api_keys: Option<ApiKeysConfig>,
    pub database: Option<DatabaseConfig>,
    pub gemini: Option<GeminiConfig>,
    pub extraction: Option<ExtractionConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ApiKeysConfig {
    pub gemini_api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GeminiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExtractionConfig {
    pub model: Option<String>,
    pub validate_output: Option<bool>,
}

impl AgentsConfig {
    /// Load from the default config path, layered with `FINSTATEMENT__*`
    /// environment variables. A missing file is not an error.
    pub fn load() -> Result<(Self, PathBuf)> {
        let config_path = get_config_path();
        let config = Self::load_from(&config_path)?;
        Ok((config, config_path))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: &Path, env: Environment) -> Result<Self> {
        let builder = Config::builder()
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to read config at {:?}", path))?;

        let config: AgentsConfig = builder
            .try_deserialize()
            .with_context(|| format!("Invalid config at {:?}", path))?;
        Ok(config)
    }

    /// Configured key, else `GEMINI_API_KEY`, else `GOOGLE_API_KEY`
    pub fn gemini_api_key(&self) -> Option<String> {
        self.gemini_api_key_with(|name| std::env::var(name).ok())
    }

    fn gemini_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        let non_empty = |key: &String| !key.trim().is_empty();
        self.api_keys
            .as_ref()
            .and_then(|keys| keys.gemini_api_key.clone())
            .filter(non_empty)
            .or_else(|| lookup("GEMINI_API_KEY").filter(non_empty))
            .or_else(|| lookup("GOOGLE_API_KEY").filter(non_empty))
    }

    pub fn gemini_base_url(&self) -> String {
        self.gemini
            .as_ref()
            .and_then(|g| g.base_url.clone())
            .unwrap_or_else(|| GEMINI_API_BASE_URL.to_string())
    }

    pub fn gemini_timeout(&self) -> Duration {
        Duration::from_secs(
            self.gemini
                .as_ref()
                .and_then(|g| g.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn model(&self) -> Option<String> {
        self.extraction.as_ref().and_then(|e| e.model.clone())
    }

    pub fn validate_output(&self) -> bool {
        self.extraction
            .as_ref()
            .and_then(|e| e.validate_output)
            .unwrap_or(true)
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        if let Some(path) = self.database.as_ref().and_then(|db| db.path.as_ref()) {
            return Ok(PathBuf::from(path));
        }

        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;
        Ok(data_dir.join("finstatement").join("agents.sqlite"))
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("finstatement").join("agents.toml")
    } else {
        PathBuf::from("agents.toml")
    }
}
