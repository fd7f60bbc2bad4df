//! # Error Taxonomy
//!
//! Only two things abort an analysis or an export: the inventory could not be
//! produced, or the caller asked for an export format that does not exist.
//! Everything else (malformed items, failed probes) is recorded inside the
//! snapshot instead of being raised.

use std::sync::Arc;

use thiserror::Error;

/// Cloneable so callers that queued behind a failed rebuild receive the same error.
#[derive(Debug, Clone, Error)]
pub enum TopologyError {
    /// The inventory provider could not produce any facts. The rebuild is
    /// aborted and a previously cached snapshot is left in place.
    #[error("failed to detect inventory: {0:#}")]
    Inventory(Arc<anyhow::Error>),

    /// The caller cancelled before the inventory was available.
    #[error("analysis cancelled before the inventory was available")]
    Cancelled,

    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to serialize topology: {0}")]
    Serialization(Arc<serde_json::Error>),
}

impl TopologyError {
    pub fn inventory(err: anyhow::Error) -> Self {
        Self::Inventory(Arc::new(err))
    }
}

impl From<serde_json::Error> for TopologyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(Arc::new(err))
    }
}

pub type TopologyResult<T> = Result<T, TopologyError>;
