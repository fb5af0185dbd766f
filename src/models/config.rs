//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client behavior and the global fetch limit
    #[serde(default)]
    pub http: HttpConfig,

    /// Storefront and search-index endpoints
    #[serde(default)]
    pub site: SiteConfig,

    /// Scheduled re-check settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Alert delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Persisted state settings
    #[serde(default)]
    pub storage: StorageConfig,
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

    /// Apply overrides from environment variables, if present.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(concurrent) = std::env::var("STOCKWATCH_MAX_CONCURRENT") {
            if let Ok(n) = concurrent.parse() {
                self.http.max_concurrent = n;
            }
        }

        if let Ok(interval) = std::env::var("STOCKWATCH_POLL_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                self.poll.interval_secs = secs;
            }
        }

        if let Ok(webhook) = std::env::var("STOCKWATCH_WEBHOOK_URL") {
            if !webhook.trim().is_empty() {
                self.notify.webhook_url = Some(webhook);
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.max_concurrent == 0 {
            return Err(AppError::validation("http.max_concurrent must be > 0"));
        }
        if self.poll.interval_secs == 0 {
            return Err(AppError::validation("poll.interval_secs must be > 0"));
        }
        if self.site.domain.trim().is_empty() {
            return Err(AppError::validation("site.domain is empty"));
        }
        url::Url::parse(&self.site.storefront_url)
            .map_err(|e| AppError::validation(format!("site.storefront_url: {e}")))?;
        url::Url::parse(&self.site.search_url)
            .map_err(|e| AppError::validation(format!("site.search_url: {e}")))?;
        if let Some(webhook) = &self.notify.webhook_url {
            url::Url::parse(webhook)
                .map_err(|e| AppError::validation(format!("notify.webhook_url: {e}")))?;
        }
        if self.storage.db_file.trim().is_empty() {
            return Err(AppError::validation("storage.db_file is empty"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum outstanding fetches across resolve batches and poll cycles
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Storefront and search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the storefront; relative product URLs resolve against it
    #[serde(default = "defaults::storefront_url")]
    pub storefront_url: String,

    /// Registrable domain used to recognize direct product links
    #[serde(default = "defaults::domain")]
    pub domain: String,

    /// Search-index JSON endpoint
    #[serde(default = "defaults::search_url")]
    pub search_url: String,

    /// Search-index site identifier
    #[serde(default = "defaults::search_site_id")]
    pub search_site_id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            storefront_url: defaults::storefront_url(),
            domain: defaults::domain(),
            search_url: defaults::search_url(),
            search_site_id: defaults::search_site_id(),
        }
    }
}

impl SiteConfig {
    /// Storefront base without a trailing slash.
    pub fn base(&self) -> &str {
        self.storefront_url.trim_end_matches('/')
    }

    /// Add-to-cart link for a numeric product id.
    pub fn cart_url(&self, product_id: &str) -> String {
        format!("{}/cart.php?action=add&product_id={}", self.base(), product_id)
    }

    /// Storefront lookup page for a numeric product id.
    pub fn product_lookup_url(&self, product_id: &str) -> String {
        format!("{}/products.php?productId={}", self.base(), product_id)
    }
}

/// Poller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between poll cycles
    #[serde(default = "defaults::poll_interval")]
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::poll_interval(),
        }
    }
}

/// Alert delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    /// Webhook receiving `{"subject", "body"}` posts; log-only when unset
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Persisted state settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file name, relative to the storage directory
    #[serde(default = "defaults::db_file")]
    pub db_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_file: defaults::db_file(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; stockwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        5
    }

    // Site defaults
    pub fn storefront_url() -> String {
        "https://us.jellycat.com".into()
    }
    pub fn domain() -> String {
        "jellycat.com".into()
    }
    pub fn search_url() -> String {
        "https://bmcyq0.a.searchspring.io/api/search/search.json".into()
    }
    pub fn search_site_id() -> String {
        "bmcyq0".into()
    }

    // Poll defaults
    pub fn poll_interval() -> u64 {
        5 * 60
    }

    // Storage defaults
    pub fn db_file() -> String {
        "db.json".into()
    }
}
