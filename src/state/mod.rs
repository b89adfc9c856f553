//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: Tracks the state of individual pages during one run
//! - `DomainState`: Tracks per-domain request pacing

mod domain_state;
mod page_state;

// Re-export main types
pub use domain_state::DomainState;
pub use page_state::PageState;
