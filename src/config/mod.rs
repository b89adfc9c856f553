//! Configuration module for course-watch
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! command-line flags and environment variables. Validation runs once on the
//! merged result.
//!
//! # Example
//!
//! ```no_run
//! use course_watch::config::{load_config, validate, Overrides};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("course-watch.toml")).unwrap();
//! Overrides { chat_id: Some("-100".into()), ..Overrides::default() }.apply(&mut config);
//! validate(&config, true).unwrap();
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, NotifierConfig, StoreConfig, UserAgentConfig, DEFAULT_DATABASE_PATH,
    DEFAULT_DETAIL_PREFIX, DEFAULT_DOMAIN, DEFAULT_EXCLUDE_MARKER, DEFAULT_ROOT_URL,
    DEFAULT_TELEGRAM_API,
};

// Re-export parser functions
pub use parser::{config_fingerprint, load_config, parse_config, Overrides};
pub use validation::validate;
