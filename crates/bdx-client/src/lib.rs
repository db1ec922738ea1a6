//! Authenticated request pipeline and session persistence for the auction
//! backend.
//!
//! `SessionStore` is the single owner of the persisted session (token pair,
//! email, active item id). `ApiClient` wraps every outbound call with bearer
//! attachment, content negotiation, and the bounded refresh-and-retry
//! protocol; typed endpoint wrappers live in [`endpoints`] as inherent
//! methods on the client.

pub mod api;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod session;

pub use api::{ApiClient, Payload, RequestBody};
pub use config::Config;
pub use error::ApiError;
pub use session::SessionStore;
