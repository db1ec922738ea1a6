//! Auction view synchronization engine.
//!
//! Keeps one auction's displayed state consistent with the server: periodic
//! snapshot polling, locally smoothed countdowns re-seeded from every poll,
//! pure action gating, and exactly-once auto-close. The engine is UI
//! agnostic; consumers receive [`bdx_types::ViewEvent`]s through a sink and
//! never see a direct stdout write.

pub mod countdown;
pub mod gating;
pub mod scheduler;
pub mod view;

pub use countdown::LocalCountdown;
pub use gating::ActionGates;
pub use scheduler::{repeat, TaskHandle, TimerScope};
pub use view::{AuctionView, EventSink, ViewOptions};
