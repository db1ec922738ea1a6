//! Typed wrappers over the request pipeline, one per backend route.
//!
//! Mutations are thin: they perform exactly one pipeline call; the
//! synchronization engine is responsible for the follow-up snapshot refresh.

use serde_json::json;
use bdx_types::{AuctionSnapshot, BidRequest, NewItem, TokenPair, Winner};

use crate::api::{ApiClient, Method, RequestBody};
use crate::error::ApiError;

impl ApiClient {
    /// `POST /auth/register`. A 409 on re-registration is a normal outcome
    /// for the combined register+login flow; callers decide whether to
    /// ignore it.
    pub async fn register(&self, email: &str, password: &str) -> Result<(), ApiError> {
        self.request(
            Method::POST,
            "/auth/register",
            &RequestBody::Json(json!({
                "email": email,
                "password": password,
                "role": "viewer",
            })),
        )
        .await?;
        Ok(())
    }

    /// `POST /auth/login` (form-encoded). On success the pair and email are
    /// persisted through the session store.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, ApiError> {
        let form = vec![
            ("username".to_string(), email.to_string()),
            ("password".to_string(), password.to_string()),
        ];
        let pair: TokenPair = self
            .request(Method::POST, "/auth/login", &RequestBody::Form(form))
            .await?
            .into_typed()?;

        if let Err(e) = self.store().set_tokens(Some(&pair)) {
            tracing::error!("failed to persist login tokens: {e:#}");
        }
        if let Err(e) = self.store().set_email(email) {
            tracing::error!("failed to persist email: {e:#}");
        }
        tracing::info!(email, "logged in");
        Ok(pair)
    }

    /// Best-effort server-side revoke, then clears the local session.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if self.store().tokens().is_some() {
            if let Err(e) = self
                .request(Method::POST, "/auth/logout", &RequestBody::Empty)
                .await
            {
                tracing::warn!("token revoke during logout failed: {e}");
            }
        }
        if let Err(e) = self.store().clear() {
            tracing::error!("failed to clear session: {e:#}");
        }
        Ok(())
    }

    /// `GET /auth/inventory`.
    pub async fn inventory(&self) -> Result<serde_json::Value, ApiError> {
        self.get_json("/auth/inventory").await
    }

    /// `GET /items`.
    pub async fn list_items(&self) -> Result<Vec<AuctionSnapshot>, ApiError> {
        self.get_json("/items").await
    }

    /// `GET /items/active` — the current user's active auction, if any.
    /// An empty or `null` body maps to `None`.
    pub async fn active_item(&self) -> Result<Option<AuctionSnapshot>, ApiError> {
        match self
            .request(Method::GET, "/items/active", &RequestBody::Empty)
            .await?
        {
            crate::api::Payload::Text(text) if text.trim().is_empty() => Ok(None),
            payload => payload.into_typed(),
        }
    }

    /// `POST /items`. The returned id becomes the persisted active item.
    pub async fn create_item(&self, item: &NewItem) -> Result<AuctionSnapshot, ApiError> {
        let value = serde_json::to_value(item).map_err(ApiError::decode)?;
        let created: AuctionSnapshot = self.post_json("/items", value).await?;
        if let Err(e) = self.store().set_active_item(Some(created.id)) {
            tracing::error!("failed to persist active item: {e:#}");
        }
        tracing::info!(id = created.id, title = %created.title, "created auction item");
        Ok(created)
    }

    /// `GET /items/:id` — one full auction snapshot.
    pub async fn get_item(&self, id: i64) -> Result<AuctionSnapshot, ApiError> {
        self.get_json(&format!("/items/{id}")).await
    }

    /// `POST /items/:id/join`.
    pub async fn join(&self, id: i64) -> Result<(), ApiError> {
        self.request(
            Method::POST,
            &format!("/items/{id}/join"),
            &RequestBody::Empty,
        )
        .await?;
        tracing::info!(id, "joined auction");
        Ok(())
    }

    /// `POST /items/:id/leave`.
    pub async fn leave(&self, id: i64) -> Result<(), ApiError> {
        self.request(
            Method::POST,
            &format!("/items/{id}/leave"),
            &RequestBody::Empty,
        )
        .await?;
        tracing::info!(id, "left auction");
        Ok(())
    }

    /// `POST /items/:id/bid`.
    pub async fn bid(&self, id: i64, bid: &BidRequest) -> Result<(), ApiError> {
        let value = serde_json::to_value(bid).map_err(ApiError::decode)?;
        self.request(Method::POST, &format!("/items/{id}/bid"), &RequestBody::Json(value))
            .await?;
        tracing::info!(id, amount = bid.amount, "bid placed");
        Ok(())
    }

    /// `POST /items/:id/close` — returns the winner.
    pub async fn close(&self, id: i64) -> Result<Winner, ApiError> {
        let winner: Winner = self
            .request(
                Method::POST,
                &format!("/items/{id}/close"),
                &RequestBody::Empty,
            )
            .await?
            .into_typed()?;
        tracing::info!(id, winner = winner.winner_user_id, "auction closed");
        Ok(winner)
    }
}
