//! Client-side action gating.
//!
//! A pure function of the latest snapshot, recomputed on every poll. Gating
//! only prevents sending requests the server would reject; the server
//! remains authoritative.

use bdx_types::{AuctionSnapshot, AuctionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionGates {
    pub can_join: bool,
    pub can_leave: bool,
    pub can_bid: bool,
}

impl ActionGates {
    /// Everything gated off (no snapshot yet).
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: &AuctionSnapshot) -> Self {
        let scheduled = snapshot.status == AuctionStatus::Scheduled;
        Self {
            can_join: scheduled && !snapshot.joined,
            can_leave: snapshot.joined && scheduled,
            can_bid: snapshot.joined
                && snapshot.status == AuctionStatus::InProgress
                && snapshot.seconds_to_end.unwrap_or(0) > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: AuctionStatus, joined: bool, to_end: Option<i64>) -> AuctionSnapshot {
        AuctionSnapshot {
            id: 1,
            title: String::new(),
            description: String::new(),
            base_price: 0.0,
            min_start_price: 0.0,
            status,
            start_at: None,
            end_at: None,
            seconds_to_start: None,
            seconds_to_end: to_end,
            current_bid: None,
            players: 0,
            joined,
            image: None,
        }
    }

    #[test]
    fn test_join_leave_only_while_scheduled() {
        let gates = ActionGates::from_snapshot(&snapshot(AuctionStatus::Scheduled, false, None));
        assert!(gates.can_join && !gates.can_leave && !gates.can_bid);

        let gates = ActionGates::from_snapshot(&snapshot(AuctionStatus::Scheduled, true, None));
        assert!(!gates.can_join && gates.can_leave && !gates.can_bid);

        let gates = ActionGates::from_snapshot(&snapshot(AuctionStatus::InProgress, false, Some(10)));
        assert!(!gates.can_join && !gates.can_leave);
    }

    #[test]
    fn test_bid_requires_joined_in_progress_with_time_left() {
        let gates = ActionGates::from_snapshot(&snapshot(AuctionStatus::InProgress, true, Some(10)));
        assert!(gates.can_bid);

        // Any one precondition failing gates the bid off.
        for snap in [
            snapshot(AuctionStatus::InProgress, false, Some(10)),
            snapshot(AuctionStatus::Scheduled, true, Some(10)),
            snapshot(AuctionStatus::Closed, true, Some(10)),
            snapshot(AuctionStatus::InProgress, true, Some(0)),
            snapshot(AuctionStatus::InProgress, true, None),
        ] {
            assert!(!ActionGates::from_snapshot(&snap).can_bid, "{snap:?}");
        }
    }

    #[test]
    fn test_closed_gates_everything_off() {
        let gates = ActionGates::from_snapshot(&snapshot(AuctionStatus::Closed, true, None));
        assert_eq!(gates, ActionGates::none());
    }
}
