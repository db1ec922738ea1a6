//! Locally smoothed countdown display.
//!
//! The server owns auction timing; between polls the latest
//! `seconds_to_start` / `seconds_to_end` is decremented locally for a smooth
//! display. Every applied poll re-seeds the countdown, so local drift never
//! survives past the next server read.

use bdx_types::{AuctionSnapshot, AuctionStatus, CountdownPhase};

/// Derived display countdown for one auction view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalCountdown {
    pub phase: CountdownPhase,
    pub remaining: i64,
}

impl LocalCountdown {
    /// Seeds the countdown from a freshly applied snapshot.
    ///
    /// Returns `None` for closed auctions (nothing left to count). An
    /// in-progress auction with no reported `seconds_to_end` falls back to
    /// `fallback_end_secs`.
    pub fn seed(snapshot: &AuctionSnapshot, fallback_end_secs: i64) -> Option<Self> {
        match snapshot.status {
            AuctionStatus::Scheduled => Some(Self {
                phase: CountdownPhase::Starting,
                remaining: snapshot.seconds_to_start.unwrap_or(0).max(0),
            }),
            AuctionStatus::InProgress => Some(Self {
                phase: CountdownPhase::Ending,
                remaining: snapshot
                    .seconds_to_end
                    .unwrap_or(fallback_end_secs)
                    .max(0),
            }),
            AuctionStatus::Closed => None,
        }
    }

    /// One local tick between polls. Never goes below zero.
    ///
    /// When the start countdown hits zero the display switches to the
    /// ending countdown, seeded from the snapshot's `seconds_to_end` or the
    /// fallback window if the server has not reported `in_progress` yet.
    pub fn tick(&mut self, snapshot: Option<&AuctionSnapshot>, fallback_end_secs: i64) {
        match self.phase {
            CountdownPhase::Starting => {
                if self.remaining > 0 {
                    self.remaining -= 1;
                }
                if self.remaining == 0 {
                    let seed = snapshot
                        .and_then(|s| s.seconds_to_end)
                        .unwrap_or(fallback_end_secs);
                    *self = Self {
                        phase: CountdownPhase::Ending,
                        remaining: seed.max(0),
                    };
                }
            }
            CountdownPhase::Ending => {
                if self.remaining > 0 {
                    self.remaining -= 1;
                }
            }
        }
    }

    /// True once the ending countdown has run out (the close condition).
    pub fn expired(&self) -> bool {
        self.phase == CountdownPhase::Ending && self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: AuctionStatus, to_start: Option<i64>, to_end: Option<i64>) -> AuctionSnapshot {
        AuctionSnapshot {
            id: 42,
            title: "Mystery".to_string(),
            description: String::new(),
            base_price: 10.0,
            min_start_price: 0.0,
            status,
            start_at: None,
            end_at: None,
            seconds_to_start: to_start,
            seconds_to_end: to_end,
            current_bid: None,
            players: 0,
            joined: false,
            image: None,
        }
    }

    #[test]
    fn test_seed_by_status() {
        let s = snapshot(AuctionStatus::Scheduled, Some(10), None);
        assert_eq!(
            LocalCountdown::seed(&s, 60),
            Some(LocalCountdown {
                phase: CountdownPhase::Starting,
                remaining: 10
            })
        );

        let s = snapshot(AuctionStatus::InProgress, None, Some(35));
        assert_eq!(
            LocalCountdown::seed(&s, 60),
            Some(LocalCountdown {
                phase: CountdownPhase::Ending,
                remaining: 35
            })
        );

        let s = snapshot(AuctionStatus::Closed, None, None);
        assert_eq!(LocalCountdown::seed(&s, 60), None);
    }

    #[test]
    fn test_seed_clamps_negative_server_values() {
        let s = snapshot(AuctionStatus::Scheduled, Some(-3), None);
        assert_eq!(LocalCountdown::seed(&s, 60).unwrap().remaining, 0);
    }

    #[test]
    fn test_seed_in_progress_without_end_uses_fallback() {
        let s = snapshot(AuctionStatus::InProgress, None, None);
        assert_eq!(LocalCountdown::seed(&s, 60).unwrap().remaining, 60);
    }

    #[test]
    fn test_start_reaching_zero_switches_to_ending() {
        let s = snapshot(AuctionStatus::Scheduled, Some(1), Some(30));
        let mut cd = LocalCountdown::seed(&s, 60).unwrap();
        cd.tick(Some(&s), 60);
        assert_eq!(
            cd,
            LocalCountdown {
                phase: CountdownPhase::Ending,
                remaining: 30
            }
        );
    }

    #[test]
    fn test_start_reaching_zero_without_server_end_uses_fallback() {
        let s = snapshot(AuctionStatus::Scheduled, Some(1), None);
        let mut cd = LocalCountdown::seed(&s, 60).unwrap();
        cd.tick(Some(&s), 60);
        assert_eq!(cd.phase, CountdownPhase::Ending);
        assert_eq!(cd.remaining, 60);
    }

    #[test]
    fn test_ending_never_goes_negative() {
        let s = snapshot(AuctionStatus::InProgress, None, Some(1));
        let mut cd = LocalCountdown::seed(&s, 60).unwrap();
        cd.tick(Some(&s), 60);
        assert!(cd.expired());
        cd.tick(Some(&s), 60);
        cd.tick(Some(&s), 60);
        assert_eq!(cd.remaining, 0);
    }
}
