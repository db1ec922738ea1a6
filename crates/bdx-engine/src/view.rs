//! Per-auction view state machine.
//!
//! Mounting a view starts two scoped timers: a snapshot poll on the
//! configured cadence (first fetch immediate) and a local countdown tick.
//! Unmounting cancels both and discards any in-flight result that would
//! otherwise arrive after teardown. Changing the auction id means
//! unmounting and mounting a fresh view; the close latch is per mounted
//! view and is never reset.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use bdx_client::{ApiClient, ApiError, Config};
use bdx_types::{AuctionSnapshot, AuctionStatus, BidRequest, ViewEvent, Winner};

use crate::countdown::LocalCountdown;
use crate::gating::ActionGates;
use crate::scheduler::TimerScope;

/// Event sink type for receiving view events.
pub type EventSink = Box<dyn FnMut(ViewEvent) + Send>;

/// Tunables for one mounted view.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    /// Snapshot poll cadence.
    pub poll_interval: Duration,
    /// Local countdown tick.
    pub tick_interval: Duration,
    /// Ending window used when the start countdown runs out before the
    /// server reports the auction in progress.
    pub fallback_end_secs: i64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            tick_interval: Duration::from_secs(1),
            fallback_end_secs: 60,
        }
    }
}

impl ViewOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            tick_interval: config.tick_interval(),
            fallback_end_secs: config.fallback_end_secs,
        }
    }
}

/// Admits `seq` iff it is newer than everything applied so far.
///
/// Poll responses must be applied in issue order; a response to an older
/// request arriving after a newer one is discarded so the countdown never
/// jumps backward.
fn admit(applied: &AtomicU64, seq: u64) -> bool {
    applied.fetch_max(seq, Ordering::SeqCst) < seq
}

struct Shared {
    client: Arc<ApiClient>,
    item_id: i64,
    fallback_end_secs: i64,
    snapshot: Mutex<Option<AuctionSnapshot>>,
    countdown: Mutex<Option<LocalCountdown>>,
    issue_seq: AtomicU64,
    applied_seq: AtomicU64,
    /// One-shot guard: the close action fires at most once per mounted view,
    /// whether triggered by the local countdown, a manual close, or a poll
    /// reporting the auction already closed.
    close_latch: AtomicBool,
    sink: Mutex<EventSink>,
    cancelled: CancellationToken,
}

impl Shared {
    fn emit(&self, event: ViewEvent) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        (sink)(event);
    }

    fn latest_snapshot(&self) -> Option<AuctionSnapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// One poll: fetch a snapshot and apply it if still current.
    async fn poll_once(&self) {
        let seq = self.issue_seq.fetch_add(1, Ordering::SeqCst) + 1;
        match self.client.get_item(self.item_id).await {
            Ok(snapshot) => self.apply_snapshot(seq, snapshot),
            Err(e) => {
                if self.cancelled.is_cancelled() {
                    return;
                }
                // Transient: the cadence keeps going.
                tracing::warn!(item = self.item_id, error = %e, "snapshot poll failed");
                self.emit(ViewEvent::ReadFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    fn apply_snapshot(&self, seq: u64, snapshot: AuctionSnapshot) {
        if self.cancelled.is_cancelled() {
            return; // view unmounted while the request was in flight
        }
        if !admit(&self.applied_seq, seq) {
            tracing::trace!(item = self.item_id, seq, "stale poll response discarded");
            return;
        }

        let countdown = LocalCountdown::seed(&snapshot, self.fallback_end_secs);
        let closed = snapshot.status == AuctionStatus::Closed;
        let last_bid_winner = snapshot.current_bid.map(|bid| Winner {
            winner_user_id: bid.user_id,
            amount: bid.amount,
        });

        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        *self
            .countdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = countdown;

        self.emit(ViewEvent::SnapshotApplied { snapshot });
        if let Some(cd) = countdown {
            self.emit(ViewEvent::Countdown {
                phase: cd.phase,
                remaining: cd.remaining,
            });
        }

        if closed && !self.close_latch.swap(true, Ordering::SeqCst) {
            // Server closed it first; never send our own close call.
            self.emit(ViewEvent::AuctionClosed {
                winner: last_bid_winner,
            });
        }
    }

    /// One local countdown tick between polls.
    async fn tick_once(&self) {
        let snapshot = self.latest_snapshot();
        let ticked = {
            let mut guard = self
                .countdown
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match guard.as_mut() {
                Some(cd) => {
                    cd.tick(snapshot.as_ref(), self.fallback_end_secs);
                    Some(*cd)
                }
                None => None,
            }
        };

        let Some(cd) = ticked else { return };
        self.emit(ViewEvent::Countdown {
            phase: cd.phase,
            remaining: cd.remaining,
        });
        if cd.expired() {
            self.auto_close().await;
        }
    }

    /// Invokes the close mutation exactly once per mounted view.
    async fn auto_close(&self) {
        if self.close_latch.swap(true, Ordering::SeqCst) {
            return; // already closed (by us, by a poll, or manually)
        }
        tracing::info!(item = self.item_id, "ending countdown reached zero; closing");
        match self.client.close(self.item_id).await {
            Ok(winner) => {
                self.emit(ViewEvent::AuctionClosed {
                    winner: Some(winner),
                });
                self.poll_once().await;
            }
            Err(e) => {
                // Latch stays set: one failed close is not retried on every
                // subsequent timer firing.
                tracing::warn!(item = self.item_id, error = %e, "auto-close failed");
                self.emit(ViewEvent::ActionFailed {
                    message: e.to_string(),
                });
            }
        }
    }
}

/// A mounted auction view.
pub struct AuctionView {
    shared: Arc<Shared>,
    scope: TimerScope,
}

impl AuctionView {
    /// Mounts the view: immediate snapshot fetch, then polling and local
    /// ticking on their cadences until `unmount()` (or drop).
    pub fn mount(
        client: Arc<ApiClient>,
        item_id: i64,
        options: &ViewOptions,
        sink: EventSink,
    ) -> Self {
        let scope = TimerScope::new();
        let shared = Arc::new(Shared {
            client,
            item_id,
            fallback_end_secs: options.fallback_end_secs,
            snapshot: Mutex::new(None),
            countdown: Mutex::new(None),
            issue_seq: AtomicU64::new(0),
            applied_seq: AtomicU64::new(0),
            close_latch: AtomicBool::new(false),
            sink: Mutex::new(sink),
            cancelled: scope.token(),
        });

        let poller = Arc::clone(&shared);
        scope.repeat(options.poll_interval, move || {
            let poller = Arc::clone(&poller);
            async move { poller.poll_once().await }
        });

        let ticker = Arc::clone(&shared);
        scope.repeat(options.tick_interval, move || {
            let ticker = Arc::clone(&ticker);
            async move { ticker.tick_once().await }
        });

        Self { shared, scope }
    }

    pub fn item_id(&self) -> i64 {
        self.shared.item_id
    }

    /// Latest applied snapshot, if any poll has succeeded yet.
    pub fn snapshot(&self) -> Option<AuctionSnapshot> {
        self.shared.latest_snapshot()
    }

    /// Action gates derived from the latest snapshot (all off before the
    /// first successful poll).
    pub fn gates(&self) -> ActionGates {
        self.snapshot()
            .as_ref()
            .map_or_else(ActionGates::none, ActionGates::from_snapshot)
    }

    /// True once the close latch has fired.
    pub fn closed(&self) -> bool {
        self.shared.close_latch.load(Ordering::SeqCst)
    }

    /// Forces an immediate snapshot refresh (outside the poll cadence).
    pub async fn refresh(&self) {
        self.shared.poll_once().await;
    }

    /// Joins the auction, then refreshes so gating reflects the membership
    /// without waiting for the next scheduled poll.
    pub async fn join(&self) -> Result<(), ApiError> {
        self.shared.client.join(self.shared.item_id).await?;
        self.shared.poll_once().await;
        Ok(())
    }

    /// Leaves the auction before start.
    pub async fn leave(&self) -> Result<(), ApiError> {
        self.shared.client.leave(self.shared.item_id).await?;
        self.shared.poll_once().await;
        Ok(())
    }

    /// Places a bid. Rejected client-side (no network call) unless the
    /// latest snapshot allows bidding and the amount parses as a positive
    /// number; business validation stays server-side.
    pub async fn place_bid(&self, bid: BidRequest) -> Result<(), ApiError> {
        if !self.gates().can_bid {
            return Err(ApiError::rejected(
                "bidding requires a joined, in-progress auction with time remaining",
            ));
        }
        if !bid.amount.is_finite() || bid.amount <= 0.0 {
            return Err(ApiError::rejected("bid amount must be a positive number"));
        }
        self.shared.client.bid(self.shared.item_id, &bid).await?;
        self.shared.poll_once().await;
        Ok(())
    }

    /// Forces a close now (the manual "Force Close" path). Sets the latch so
    /// the countdown trigger cannot close a second time.
    pub async fn close_now(&self) -> Result<Winner, ApiError> {
        let winner = self.shared.client.close(self.shared.item_id).await?;
        if !self.shared.close_latch.swap(true, Ordering::SeqCst) {
            self.shared.emit(ViewEvent::AuctionClosed {
                winner: Some(winner),
            });
        }
        self.shared.poll_once().await;
        Ok(winner)
    }

    /// Tears the view down: cancels the poll schedule and both countdown
    /// timers; in-flight results are discarded.
    pub fn unmount(self) {
        self.scope.cancel();
    }
}
