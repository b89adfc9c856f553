//! Delivery of the new-course report
//!
//! The crawl only needs "send this text, tell me if it worked". Telegram is
//! the production channel; stdout is used when the report should only be
//! printed.

mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while delivering a message
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Missing notifier setting: {0}")]
    Missing(&'static str),

    #[error("Failed to write message: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for notification operations
pub type NotifyResult<T> = Result<T, NotifyError>;

/// A channel that accepts one formatted text message
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `text`; an error means the message was not accepted
    async fn send(&self, text: &str) -> NotifyResult<()>;
}

/// Writes the message to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, text: &str) -> NotifyResult<()> {
        use std::io::Write;

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(text.as_bytes())?;
        handle.flush()?;
        Ok(())
    }
}
