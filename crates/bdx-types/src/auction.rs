use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an auction, totally ordered by time.
///
/// The server never regresses a status; ordering is used by consumers to
/// detect (and reject) impossible transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    Scheduled,
    InProgress,
    Closed,
}

impl AuctionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuctionStatus::Scheduled => "scheduled",
            AuctionStatus::InProgress => "in_progress",
            AuctionStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highest bid reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentBid {
    pub amount: f64,
    pub user_id: i64,
}

/// Item imagery; either URL may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemImage {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_thumb_url: Option<String>,
}

/// Complete server-reported state of one auction at a point in time.
///
/// Produced by `GET /items/:id` on every poll and replaced wholesale; the
/// client never computes these fields itself. `seconds_to_start` /
/// `seconds_to_end` seed the locally smoothed countdown between polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub base_price: f64,
    #[serde(default)]
    pub min_start_price: f64,
    pub status: AuctionStatus,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seconds_to_start: Option<i64>,
    #[serde(default)]
    pub seconds_to_end: Option<i64>,
    #[serde(default)]
    pub current_bid: Option<CurrentBid>,
    #[serde(default)]
    pub players: u32,
    #[serde(default)]
    pub joined: bool,
    #[serde(default)]
    pub image: Option<ItemImage>,
}

/// Winner information returned by `POST /items/:id/close`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    pub winner_user_id: i64,
    pub amount: f64,
}

/// Client-side bid payload. Only numeric parseability is checked locally;
/// all business validation is server-side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidRequest {
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_increment: Option<f64>,
}

impl BidRequest {
    pub fn amount(amount: f64) -> Self {
        Self {
            amount,
            max_budget: None,
            bid_increment: None,
        }
    }
}

/// Payload for `POST /items` (auction creation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub base_price: f64,
    pub close_at: DateTime<Utc>,
}
