/// Page state definitions for tracking crawl progress
///
/// Every address admitted to the frontier moves through these states during
/// one run. Nothing here is persisted: only course records outlive a run.
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Page is queued and waiting to be fetched
    Queued,

    /// Page is currently being fetched
    Fetching,

    // ===== Terminal Success States =====
    /// Page was fetched and yielded a course record
    Processed,

    /// Page was fetched but is not a course page (listing or other)
    NotCourse,

    // ===== Terminal Error States =====
    /// Page fetch failed (network error, HTTP error, unreadable body)
    Failed,

    /// Page Content-Type is not HTML
    ContentMismatch,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::Fetching)
    }

    /// Returns true if the page was fetched and parsed
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed | Self::NotCourse)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed | Self::ContentMismatch)
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Processed => "processed",
            Self::NotCourse => "not_course",
            Self::Failed => "failed",
            Self::ContentMismatch => "content_mismatch",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
