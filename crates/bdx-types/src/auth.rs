use serde::{Deserialize, Serialize};

/// Access/refresh token pair returned by `/auth/login` and `/auth/refresh`.
///
/// A session is valid iff both halves are non-empty; a partial pair is
/// treated everywhere as "no session".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token sent with each authenticated request.
    pub access_token: String,
    /// Longer-lived token exchanged for a new pair when the bearer expires.
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Returns true if both halves are present.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}

/// Returns a masked version of a token for logs (first 8 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 12 {
        return "***".to_string();
    }
    format!("{}...", &token[..8])
}
