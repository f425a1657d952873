use std::fmt;

use serde::Serialize;

use crate::models::stream_item::{StreamItem, Timestamp};

/// Which of the two timeline fetches an update or an error relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchPhase {
    /// The most recent window, loaded when the watched streams change.
    Snapshot,
    /// An older window, appended after the current tail.
    Backfill,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Snapshot => write!(f, "snapshot"),
            FetchPhase::Backfill => write!(f, "backfill"),
        }
    }
}

/// The errors a timeline can run into. None of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    tag = "kind"
)]
pub enum TimelineError {
    /// The stream service couldn't be reached or answered with an error.
    #[error("failed to fetch the {phase} page: {message}")]
    FetchFailed { phase: FetchPhase, message: String },
    /// A backfill was attempted without an item to take the cursor from.
    #[error("no cursor is available to backfill from")]
    PreconditionNotMet,
}

impl TimelineError {
    pub(crate) fn fetch_failed(phase: FetchPhase, error: anyhow::Error) -> Self {
        TimelineError::FetchFailed {
            phase,
            message: format!("{error:#}"),
        }
    }
}

/// Where a timeline is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    tag = "state"
)]
pub enum TimelineState {
    /// Nothing is watched, or the timeline was unmounted.
    Idle,
    /// A fetch is in flight.
    Loading { phase: FetchPhase },
    /// The last fetch completed. `has_more` tells whether older items may remain.
    Ready { has_more: bool },
}

/// The results the fetch worker sends back to a timeline.
///
/// Each one is tagged with the generation of the request that produced it,
/// so that results for streams that are no longer watched can be dropped.
#[derive(Debug)]
pub enum TimelineUpdate {
    SnapshotLoaded {
        generation: u64,
        result: Result<Vec<StreamItem>, TimelineError>,
    },
    BackfillLoaded {
        generation: u64,
        cursor: Timestamp,
        result: Result<Vec<StreamItem>, TimelineError>,
    },
}

impl TimelineUpdate {
    pub fn generation(&self) -> u64 {
        match self {
            TimelineUpdate::SnapshotLoaded { generation, .. }
            | TimelineUpdate::BackfillLoaded { generation, .. } => *generation,
        }
    }
}
