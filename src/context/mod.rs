// Page context — contest metadata embedded in the page, loaded once per page load.

pub mod loader;
pub mod payload;

use serde::Deserialize;
use thiserror::Error;

/// Contest metadata rendered by the server into the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageContext {
    /// Unix timestamp (seconds) of the contest start. `None` when the contest
    /// has no fixed start, e.g. a virtual-only practice contest.
    #[serde(default)]
    pub contest_start_timestamp: Option<f64>,
    /// Contest length in seconds.
    pub contest_duration: f64,
    /// Whether the server considered the contest started when rendering.
    pub contest_started: bool,
    /// Whether the server considered the contest over when rendering.
    pub contest_ended: bool,
    #[serde(default)]
    pub only_virtual: bool,
}

impl PageContext {
    /// Unix timestamp of the contest end, if the contest has a start.
    pub fn contest_end_timestamp(&self) -> Option<f64> {
        self.contest_start_timestamp
            .map(|start| start + self.contest_duration)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("context payload missing from page")]
    Missing,

    #[error("malformed context payload: {0}")]
    Malformed(String),

    #[error("context loader dropped before loading")]
    Abandoned,
}

pub use loader::{ContextHandle, ContextLoader, ContextResult};
pub use payload::extract_payload;
