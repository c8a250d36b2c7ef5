/// Configuration management for the Box feed core
use crate::error::{FeedError, FeedResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Top-level feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub api: ApiConfig,
    pub paging: PagingConfig,
    pub scroll: ScrollConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Page sizes for forward pagination and the "fetch newest" refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    pub page_size: u32,
    pub refresh_limit: u32,
}

/// Trigger thresholds for the scroll-driven signals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Offsets at or below this count as "at the top of the list"
    pub refresh_top_threshold: f64,
    /// Distance before the end sentinel at which the next page is requested
    pub pagination_margin: f64,
}

/// Credential handed to the auth capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub bearer_token: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Emit JSON log lines instead of human-readable text
    pub json: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: 10,
                user_agent: format!("box-feed/{}", env!("CARGO_PKG_VERSION")),
            },
            paging: PagingConfig {
                page_size: 5,
                refresh_limit: 20,
            },
            scroll: ScrollConfig {
                refresh_top_threshold: 5.0,
                pagination_margin: 100.0,
            },
            auth: AuthConfig { bearer_token: None },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl FeedConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> FeedResult<Self> {
        dotenv::dotenv().ok();

        let defaults = FeedConfig::default();

        let base_url = env::var("BOX_API_BASE_URL")
            .unwrap_or(defaults.api.base_url)
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = env::var("BOX_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.api.timeout_secs);
        let user_agent = env::var("BOX_HTTP_USER_AGENT").unwrap_or(defaults.api.user_agent);

        let page_size = env::var("BOX_FEED_PAGE_SIZE")
            .unwrap_or_else(|_| defaults.paging.page_size.to_string())
            .parse()
            .map_err(|_| FeedError::Configuration("Invalid page size".to_string()))?;
        let refresh_limit = env::var("BOX_FEED_REFRESH_LIMIT")
            .unwrap_or_else(|_| defaults.paging.refresh_limit.to_string())
            .parse()
            .map_err(|_| FeedError::Configuration("Invalid refresh limit".to_string()))?;

        let refresh_top_threshold = env::var("BOX_REFRESH_TOP_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.scroll.refresh_top_threshold);
        let pagination_margin = env::var("BOX_PAGINATION_MARGIN")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.scroll.pagination_margin);

        let bearer_token = env::var("BOX_AUTH_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let level = env::var("RUST_LOG").unwrap_or(defaults.logging.level);
        let json = env::var("BOX_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(defaults.logging.json);

        let config = FeedConfig {
            api: ApiConfig {
                base_url,
                timeout_secs,
                user_agent,
            },
            paging: PagingConfig {
                page_size,
                refresh_limit,
            },
            scroll: ScrollConfig {
                refresh_top_threshold,
                pagination_margin,
            },
            auth: AuthConfig { bearer_token },
            logging: LoggingConfig { level, json },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> FeedResult<()> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            return Err(FeedError::Configuration(format!(
                "API base URL must be http(s): {}",
                self.api.base_url
            )));
        }

        if self.paging.page_size == 0 {
            return Err(FeedError::Configuration(
                "Page size must be greater than zero".to_string(),
            ));
        }

        // The refresh batch must be able to overlap the head of the list.
        if self.paging.refresh_limit < self.paging.page_size {
            return Err(FeedError::Configuration(
                "Refresh limit must be at least the page size".to_string(),
            ));
        }

        if self.scroll.refresh_top_threshold < 0.0 || self.scroll.pagination_margin < 0.0 {
            return Err(FeedError::Configuration(
                "Scroll thresholds cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}
