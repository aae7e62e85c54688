//! Runtime settings
//!
//! Resolved from, lowest precedence first: built-in defaults, an optional
//! YAML file, environment variables, then command-line flags.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::OpenAiConfig;
use crate::pipeline::PipelineOptions;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Name used by the browser build; still honoured
pub const ENV_API_KEY_LEGACY: &str = "VITE_OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "PITCH_PANDA_MODEL";
pub const ENV_VISION_MODEL: &str = "PITCH_PANDA_VISION_MODEL";
pub const ENV_TEMPERATURE: &str = "PITCH_PANDA_TEMPERATURE";
pub const ENV_TIMEOUT: &str = "PITCH_PANDA_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "PITCH_PANDA_MAX_RETRIES";
pub const ENV_VISION_CONCURRENCY: &str = "PITCH_PANDA_VISION_CONCURRENCY";
pub const ENV_MAX_PAGES: &str = "PITCH_PANDA_MAX_PAGES";
pub const ENV_DATABASE: &str = "PITCH_PANDA_DATABASE";
pub const ENV_OUTPUT_DIR: &str = "PITCH_PANDA_OUTPUT_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub vision_model: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub vision_concurrency: usize,
    pub max_pages: usize,
    pub database_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            vision_model: "gpt-4o".to_string(),
            temperature: 0.1,
            request_timeout_secs: 120,
            max_retries: 3,
            vision_concurrency: 3,
            max_pages: 5,
            database_path: default_database_path(),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Shape of the YAML config file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub vision_model: Option<String>,
    pub temperature: Option<f32>,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub vision_concurrency: Option<usize>,
    pub max_pages: Option<usize>,
    pub database_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub vision_model: Option<String>,
    pub temperature: Option<f32>,
    pub database_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// `<data dir>/pitch-panda/analyses.db`, or `./analyses.db` without a home
pub fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "pitch-panda")
        .map(|dirs| dirs.data_dir().join("analyses.db"))
        .unwrap_or_else(|| PathBuf::from("analyses.db"))
}

fn parse_env<T: std::str::FromStr>(name: &str, value: Option<String>) -> Result<Option<T>> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => match raw.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => bail!("Invalid value for {}: {:?}", name, raw),
        },
        None => Ok(None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    /// Full resolution against the process environment
    pub fn load(config_path: Option<&Path>, overrides: SettingsOverrides) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(path) = config_path {
            settings.apply_file(SettingsFile::from_path(path)?);
        }

        settings.apply_env(|name| std::env::var(name).ok())?;
        settings.apply_overrides(overrides);
        settings.validate()?;

        tracing::debug!(
            model = %settings.model,
            vision_model = %settings.vision_model,
            database = %settings.database_path.display(),
            "settings resolved"
        );

        Ok(settings)
    }

    pub fn apply_file(&mut self, file: SettingsFile) {
        if let Some(v) = non_empty(file.api_key) {
            self.api_key = Some(v);
        }
        if let Some(v) = file.base_url {
            self.base_url = v;
        }
        if let Some(v) = file.model {
            self.model = v;
        }
        if let Some(v) = file.vision_model {
            self.vision_model = v;
        }
        if let Some(v) = file.temperature {
            self.temperature = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.max_retries {
            self.max_retries = v;
        }
        if let Some(v) = file.vision_concurrency {
            self.vision_concurrency = v;
        }
        if let Some(v) = file.max_pages {
            self.max_pages = v;
        }
        if let Some(v) = file.database_path {
            self.database_path = v;
        }
        if let Some(v) = file.output_dir {
            self.output_dir = v;
        }
    }

    /// Apply environment variables read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) =
            non_empty(lookup(ENV_API_KEY)).or_else(|| non_empty(lookup(ENV_API_KEY_LEGACY)))
        {
            self.api_key = Some(key);
        }
        if let Some(v) = non_empty(lookup(ENV_BASE_URL)) {
            self.base_url = v;
        }
        if let Some(v) = non_empty(lookup(ENV_MODEL)) {
            self.model = v;
        }
        if let Some(v) = non_empty(lookup(ENV_VISION_MODEL)) {
            self.vision_model = v;
        }
        if let Some(v) = parse_env(ENV_TEMPERATURE, lookup(ENV_TEMPERATURE))? {
            self.temperature = v;
        }
        if let Some(v) = parse_env(ENV_TIMEOUT, lookup(ENV_TIMEOUT))? {
            self.request_timeout_secs = v;
        }
        if let Some(v) = parse_env(ENV_MAX_RETRIES, lookup(ENV_MAX_RETRIES))? {
            self.max_retries = v;
        }
        if let Some(v) = parse_env(ENV_VISION_CONCURRENCY, lookup(ENV_VISION_CONCURRENCY))? {
            self.vision_concurrency = v;
        }
        if let Some(v) = parse_env(ENV_MAX_PAGES, lookup(ENV_MAX_PAGES))? {
            self.max_pages = v;
        }
        if let Some(v) = non_empty(lookup(ENV_DATABASE)) {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty(lookup(ENV_OUTPUT_DIR)) {
            self.output_dir = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: SettingsOverrides) {
        if let Some(v) = non_empty(overrides.api_key) {
            self.api_key = Some(v);
        }
        if let Some(v) = overrides.base_url {
            self.base_url = v;
        }
        if let Some(v) = overrides.model {
            self.model = v;
        }
        if let Some(v) = overrides.vision_model {
            self.vision_model = v;
        }
        if let Some(v) = overrides.temperature {
            self.temperature = v;
        }
        if let Some(v) = overrides.database_path {
            self.database_path = v;
        }
        if let Some(v) = overrides.output_dir {
            self.output_dir = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            bail!("temperature must be between 0 and 2, got {}", self.temperature);
        }
        if self.vision_concurrency == 0 {
            bail!("vision_concurrency must be at least 1");
        }
        if self.max_pages == 0 {
            bail!("max_pages must be at least 1");
        }
        if url::Url::parse(&self.base_url).is_err() {
            bail!("base_url is not a valid URL: {}", self.base_url);
        }
        Ok(())
    }

    /// The API key, or an error naming where to set it
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!(
                "No API key configured. Set {} (or pass --api-key / api_key in the config file)",
                ENV_API_KEY
            ),
        }
    }

    pub fn openai_config(&self) -> Result<OpenAiConfig> {
        let mut config = OpenAiConfig::new(self.require_api_key()?);
        config.base_url = self.base_url.clone();
        config.model = self.model.clone();
        config.timeout_secs = self.request_timeout_secs;
        config.max_retries = self.max_retries;
        Ok(config)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            model: Some(self.model.clone()),
            vision_model: Some(self.vision_model.clone()),
            temperature: self.temperature,
            vision_concurrency: self.vision_concurrency,
            max_pages: self.max_pages,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SettingsFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Invalid YAML")
    }
}
