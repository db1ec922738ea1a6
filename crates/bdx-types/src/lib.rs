//! Wire types shared across the BDX workspace.
//!
//! Everything here mirrors the auction backend's JSON verbatim; the client
//! never derives these fields itself (the server is authoritative for
//! timing, pricing, and closing).

mod auction;
mod auth;
mod events;

pub use auction::{
    AuctionSnapshot, AuctionStatus, BidRequest, CurrentBid, ItemImage, NewItem, Winner,
};
pub use auth::{mask_token, TokenPair};
pub use events::{CountdownPhase, ViewEvent};
