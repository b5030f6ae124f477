use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            environment: Environment::default(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    #[serde(default = "default_collections")]
    pub collections: Vec<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AiConfig {
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_plugin")]
    pub plugin: String,
    #[serde(default = "default_flow_version")]
    pub version: String,
    pub api_key: Option<String>,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_report_flow")]
    pub report_flow: String,
    #[serde(default = "default_update_prices_flow")]
    pub update_prices_flow: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_session_max_age")]
    pub session_max_age_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            secret: String::new(),
            session_max_age_secs: default_session_max_age(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct IndexConfig {
    #[serde(default)]
    pub weights: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ReportsConfig {
    /// Directory for the on-disk report store; reports stay in memory when unset.
    pub data_path: Option<String>,
    /// Reports kept by the in-memory store before the oldest are dropped.
    pub max_in_memory: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub ai: AiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_collections() -> Vec<String> {
    vec!["commodity_prices".to_string()]
}

fn default_store_timeout() -> u64 {
    15
}

fn default_model() -> String {
    "googleai/gemini-2.0-flash".to_string()
}

fn default_plugin() -> String {
    "googleai".to_string()
}

fn default_flow_version() -> String {
    "v1".to_string()
}

fn default_ai_timeout() -> u64 {
    60
}

fn default_report_flow() -> String {
    "generateReport".to_string()
}

fn default_update_prices_flow() -> String {
    "updateCommodityPrices".to_string()
}

fn default_session_max_age() -> i64 {
    60 * 60 * 24 * 5
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("br", "ucs", "ucs-monitor")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Secrets may come from the environment instead of the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(secret) = non_empty("UCS_AUTH_SECRET") {
            debug!("Using auth secret from UCS_AUTH_SECRET");
            self.auth.secret = secret;
        }
        if let Some(key) = non_empty("UCS_STORE_API_KEY") {
            self.store.api_key = Some(key);
        }
        if let Some(key) = non_empty("UCS_AI_API_KEY") {
            self.ai.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.secret.trim().is_empty() {
            bail!("auth.secret must be set (or provide UCS_AUTH_SECRET)");
        }
        if self.auth.session_max_age_secs <= 0 {
            bail!("auth.session_max_age_secs must be positive");
        }
        if self.store.collections.is_empty() {
            bail!("store.collections must name at least one collection");
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("Invalid server.bind address: {}", self.server.bind))
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }
}
