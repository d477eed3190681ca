//! Consumer-facing view of a subscription.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of a subscription.
///
/// ```text
/// Idle -> Loading -> Ready <-> Refreshing
///            |
///            v
///          Failed -> Loading (manual or timed retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Refreshing,
    Failed,
}

/// The latest consistent state of a subscription.
///
/// Data is shared behind an `Arc`, so cloning a snapshot is cheap.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<R> {
    pub state: LoadState,
    pub data: Arc<Vec<R>>,
    pub error_message: Option<String>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl<R> Snapshot<R> {
    /// Nothing requested yet.
    pub fn idle() -> Self {
        Self {
            state: LoadState::Idle,
            data: Arc::new(Vec::new()),
            error_message: None,
            last_updated_at: None,
        }
    }

    /// Whether a view should show its empty "loading" placeholder.
    ///
    /// Only the first load does; later loads keep the old rows visible.
    pub fn is_first_load(&self) -> bool {
        self.state == LoadState::Loading && self.data.is_empty()
    }

    /// Whether a request is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, LoadState::Loading | LoadState::Refreshing)
    }

    /// Whether there is data from a successful fetch.
    pub fn has_data(&self) -> bool {
        self.last_updated_at.is_some()
    }
}

impl<R> Default for Snapshot<R> {
    fn default() -> Self {
        Self::idle()
    }
}
