//! Event contract between the synchronization engine and its consumers.
//!
//! The engine never writes to stdout/stderr; everything a UI needs arrives
//! as a `ViewEvent` through the sink supplied at mount time. Events are
//! serializable for a future JSON output mode.

use serde::{Deserialize, Serialize};

use crate::auction::{AuctionSnapshot, Winner};

/// Which countdown the view is currently displaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownPhase {
    /// Waiting for the auction to open (`seconds_to_start`).
    Starting,
    /// Auction open, counting down to close (`seconds_to_end`).
    Ending,
}

impl std::fmt::Display for CountdownPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountdownPhase::Starting => f.write_str("starts in"),
            CountdownPhase::Ending => f.write_str("ends in"),
        }
    }
}

/// Events emitted by a mounted auction view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    /// A fresh server snapshot replaced the local read model.
    SnapshotApplied { snapshot: AuctionSnapshot },

    /// Locally smoothed countdown ticked down (re-seeded on every poll).
    Countdown { phase: CountdownPhase, remaining: i64 },

    /// The auction reached its terminal state. Set at most once per mounted
    /// view: either our close call returned the winner, or a poll reported
    /// `closed` (winner then derived from the last bid, if any).
    AuctionClosed { winner: Option<Winner> },

    /// A scheduled poll failed; the cadence continues.
    ReadFailed { message: String },

    /// A mutation (join/leave/bid/close) failed.
    ActionFailed { message: String },
}
