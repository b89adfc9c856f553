use serde::{Deserialize, Serialize};

/// Default catalog root
pub const DEFAULT_ROOT_URL: &str = "https://formacionagraria.tenerife.es/";

/// Default allowed domain for the catalog
pub const DEFAULT_DOMAIN: &str = "formacionagraria.tenerife.es";

/// Path prefix shared by every course detail link
pub const DEFAULT_DETAIL_PREFIX: &str = "/acfor-fo/actividades/";

/// Marker of "request a place" action links, which must never be followed
pub const DEFAULT_EXCLUDE_MARKER: &str = "solicitud";

/// Default SQLite database file
pub const DEFAULT_DATABASE_PATH: &str = "cursos.db";

/// Default Telegram Bot API endpoint
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Main configuration structure for course-watch
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub store: StoreConfig,
    pub notifier: NotifierConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Catalog listing page the crawl starts from
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Hosts that may be fetched (e.g., "example.com" or "*.example.com")
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "request-delay")]
    pub request_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout_secs: u64,

    /// Raw href prefix that marks a course detail link
    #[serde(rename = "detail-path-prefix")]
    pub detail_path_prefix: String,

    /// Substring that marks an action link to skip
    #[serde(rename = "exclude-marker")]
    pub exclude_marker: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            root_url: DEFAULT_ROOT_URL.to_string(),
            allowed_domains: vec![DEFAULT_DOMAIN.to_string()],
            max_concurrent_requests: 3,
            request_delay_ms: 1000,
            request_timeout_secs: 30,
            detail_path_prefix: DEFAULT_DETAIL_PREFIX.to_string(),
            exclude_marker: DEFAULT_EXCLUDE_MARKER.to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "course-watch".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

/// Telegram notifier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Bot token issued by BotFather
    #[serde(rename = "bot-token")]
    pub bot_token: Option<String>,

    /// Destination chat
    #[serde(rename = "chat-id")]
    pub chat_id: Option<String>,

    /// Forum topic inside the chat
    #[serde(rename = "thread-id")]
    pub thread_id: Option<String>,

    /// Bot API base URL
    #[serde(rename = "api-base")]
    pub api_base: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            thread_id: None,
            api_base: DEFAULT_TELEGRAM_API.to_string(),
        }
    }
}
