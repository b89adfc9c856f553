use crate::config::types::{Config, CrawlerConfig};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Settings supplied on the command line or through the environment
///
/// Every `Some` value replaces the corresponding file or default value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database_path: Option<String>,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub thread_id: Option<String>,
}

impl Overrides {
    /// Applies the overrides on top of `config`
    pub fn apply(self, config: &mut Config) {
        if let Some(path) = non_empty(self.database_path) {
            config.store.database_path = path;
        }
        if let Some(token) = non_empty(self.bot_token) {
            config.notifier.bot_token = Some(token);
        }
        if let Some(chat_id) = non_empty(self.chat_id) {
            config.notifier.chat_id = Some(chat_id);
        }
        if let Some(thread_id) = non_empty(self.thread_id) {
            config.notifier.thread_id = Some(thread_id);
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Loads and parses a configuration file from the given path
///
/// Missing sections and keys fall back to their defaults. The result is not
/// validated yet: overrides are usually applied first.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use course_watch::config::load_config;
///
/// let config = load_config(Path::new("course-watch.toml")).unwrap();
/// println!("Root: {}", config.crawler.root_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

/// Computes a SHA-256 fingerprint of the crawler settings
///
/// Stored with every run so that runs made under different crawl rules can
/// be told apart.
pub fn config_fingerprint(crawler: &CrawlerConfig) -> Result<String, ConfigError> {
    let serialized = toml::to_string(crawler)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
