//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Database location
    #[serde(default)]
    pub database: DatabaseConfig,

    /// CSS selectors describing the source's page structure
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.page_size == 0 {
            return Err(AppError::validation("crawler.page_size must be > 0"));
        }
        url::Url::parse(&self.crawler.base_url)
            .map_err(|e| AppError::validation(format!("crawler.base_url: {e}")))?;
        if self.database.path.as_os_str().is_empty() {
            return Err(AppError::validation("database.path is empty"));
        }
        if self.selectors.author_delimiter.is_empty() {
            return Err(AppError::validation("selectors.author_delimiter is empty"));
        }
        for (name, value) in self.selectors.named() {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("selectors.{name} is empty")));
            }
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Scheme and host of the catalogue, without a trailing slash
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Page load timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Rows requested per listing page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_size: defaults::page_size(),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file, created on first run
    #[serde(default = "defaults::database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: defaults::database_path(),
        }
    }
}

/// CSS selectors for the listing and detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Container of listing rows
    #[serde(default = "defaults::results")]
    pub results: String,

    /// Each row inside the results container
    #[serde(default = "defaults::row")]
    pub row: String,

    /// Title block within a row
    #[serde(default = "defaults::title")]
    pub title: String,

    /// Link inside the title block pointing at the item page
    #[serde(default = "defaults::title_link")]
    pub title_link: String,

    /// Details block within a row (carries the author list)
    #[serde(default = "defaults::details")]
    pub details: String,

    /// Tag list container on the detail page
    #[serde(default = "defaults::tags")]
    pub tags: String,

    /// Each tag entry inside the tag list
    #[serde(default = "defaults::tag_item")]
    pub tag_item: String,

    /// Link inside a tag entry pointing at the tag page
    #[serde(default = "defaults::tag_link")]
    pub tag_link: String,

    /// Item title on the detail page
    #[serde(default = "defaults::detail_title")]
    pub detail_title: String,

    /// Token separating free text from the author names in a details block
    #[serde(default = "defaults::author_delimiter")]
    pub author_delimiter: String,
}

impl SelectorConfig {
    fn named(&self) -> [(&'static str, &str); 9] {
        [
            ("results", self.results.as_str()),
            ("row", self.row.as_str()),
            ("title", self.title.as_str()),
            ("title_link", self.title_link.as_str()),
            ("details", self.details.as_str()),
            ("tags", self.tags.as_str()),
            ("tag_item", self.tag_item.as_str()),
            ("tag_link", self.tag_link.as_str()),
            ("detail_title", self.detail_title.as_str()),
        ]
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            results: defaults::results(),
            row: defaults::row(),
            title: defaults::title(),
            title_link: defaults::title_link(),
            details: defaults::details(),
            tags: defaults::tags(),
            tag_item: defaults::tag_item(),
            tag_link: defaults::tag_link(),
            detail_title: defaults::detail_title(),
            author_delimiter: defaults::author_delimiter(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn base_url() -> String {
        "https://nanohub.org".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; harvester/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn page_size() -> usize {
        1000
    }

    // Database defaults
    pub fn database_path() -> PathBuf {
        PathBuf::from("harvester.db")
    }

    // Selector defaults
    pub fn results() -> String {
        ".results".into()
    }
    pub fn row() -> String {
        "li".into()
    }
    pub fn title() -> String {
        ".title".into()
    }
    pub fn title_link() -> String {
        "a".into()
    }
    pub fn details() -> String {
        ".details".into()
    }
    pub fn tags() -> String {
        ".tags".into()
    }
    pub fn tag_item() -> String {
        "li".into()
    }
    pub fn tag_link() -> String {
        ".tag".into()
    }
    pub fn detail_title() -> String {
        "#content-header h2".into()
    }
    pub fn author_delimiter() -> String {
        ":: ".into()
    }
}
