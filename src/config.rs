use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

const API_KEY_ENV: &str = "SWIPE_FEED_NEWS_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    NewsApi,
    Rss,
    Catalog,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub source: Option<SourceKind>,

    #[serde(default)]
    pub news_api: NewsApiConfig,

    #[serde(default)]
    pub rss: RssConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub explore: ExploreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsApiConfig {
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_country")]
    pub country: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RssConfig {
    /// OPML file whose top-level outlines are category labels.
    pub opml_path: Option<PathBuf>,

    /// Category label to feed URLs.
    #[serde(default)]
    pub feeds: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreConfig {
    #[serde(default)]
    pub default_categories: Vec<String>,

    #[serde(default = "default_stack_size")]
    pub stack_size: usize,

    #[serde(default = "default_refill_threshold")]
    pub refill_threshold: usize,

    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,

    pub shuffle_seed: Option<u64>,
}

fn default_base_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_country() -> String {
    "us".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "swipe-feed/0.1".to_string()
}

fn default_stack_size() -> usize {
    3
}

fn default_refill_threshold() -> usize {
    5
}

fn default_trending_limit() -> usize {
    5
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            page_size: default_page_size(),
            country: default_country(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            default_categories: vec!["Technology".to_string(), "Science".to_string()],
            stack_size: default_stack_size(),
            refill_threshold: default_refill_threshold(),
            trending_limit: default_trending_limit(),
            shuffle_seed: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config.with_env_overrides())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config.with_env_overrides())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("swipe-feed")
            .join("config.toml")
    }

    /// The source to build: the configured one, or the richest one the
    /// available settings allow.
    pub fn resolved_source(&self) -> SourceKind {
        if let Some(kind) = self.source {
            return kind;
        }
        if self.news_api.api_key.is_some() {
            SourceKind::NewsApi
        } else if !self.rss.feeds.is_empty() || self.rss.opml_path.is_some() {
            SourceKind::Rss
        } else {
            SourceKind::Catalog
        }
    }

    fn validate(&self) -> Result<()> {
        if self.explore.stack_size == 0 {
            return Err(AppError::Config("explore.stack_size must be at least 1".to_string()));
        }
        if self.explore.trending_limit == 0 {
            return Err(AppError::Config(
                "explore.trending_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.news_api.api_key = Some(key.trim().to_string());
            }
        }
        self
    }
}
