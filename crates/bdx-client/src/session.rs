//! Persisted session state (the Token Store).
//!
//! Two locations on disk mirror the two browser-side homes of the legacy
//! client: `session.json` holds the access token, email, and active item id
//! (session storage), and a separate `refresh_token` file holds the refresh
//! token (the cookie), written with restricted permissions (0600). Tokens
//! are never logged in full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use bdx_types::{mask_token, TokenPair};

const SESSION_FILE: &str = "session.json";
const REFRESH_FILE: &str = "refresh_token";

/// Contents of `session.json`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct SessionState {
    access_token: Option<String>,
    email: Option<String>,
    active_item_id: Option<i64>,
}

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    refresh_token: Option<String>,
}

/// Single authoritative holder of the current session.
///
/// Constructed once and passed explicitly (`Arc<SessionStore>`) to the
/// request pipeline and the synchronization engine; nothing else mutates the
/// session. Every setter persists synchronously before returning, so a
/// reader never observes in-memory state ahead of disk.
#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
    inner: Mutex<Inner>,
}

impl SessionStore {
    /// Opens (or initializes) the store rooted at `dir`.
    ///
    /// Missing files yield an unauthenticated session. A present but partial
    /// token pair is also unauthenticated; `tokens()` enforces that.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create session directory {}", dir.display()))?;

        let state = Self::load_state(&dir.join(SESSION_FILE))?;
        let refresh_token = Self::load_refresh(&dir.join(REFRESH_FILE))?;

        Ok(Self {
            dir,
            inner: Mutex::new(Inner {
                state,
                refresh_token,
            }),
        })
    }

    fn load_state(path: &Path) -> Result<SessionState> {
        if !path.exists() {
            return Ok(SessionState::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", path.display()))
    }

    fn load_refresh(path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read refresh token from {}", path.display()))?;
        let token = contents.trim().to_string();
        Ok((!token.is_empty()).then_some(token))
    }

    /// Replaces the token pair. `None` clears the access token and email and
    /// removes the refresh-token file (logout / irrecoverable refresh).
    pub fn set_tokens(&self, tokens: Option<&TokenPair>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match tokens {
            Some(pair) => {
                tracing::debug!(access = %mask_token(&pair.access_token), "storing token pair");
                inner.state.access_token = Some(pair.access_token.clone());
                inner.refresh_token = Some(pair.refresh_token.clone());
                self.persist_state(&inner.state)?;
                self.persist_refresh(Some(&pair.refresh_token))?;
            }
            None => {
                inner.state.access_token = None;
                inner.state.email = None;
                inner.refresh_token = None;
                self.persist_state(&inner.state)?;
                self.persist_refresh(None)?;
            }
        }
        Ok(())
    }

    /// Persists the logged-in email alongside the access token.
    pub fn set_email(&self, email: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.state.email = Some(email.to_string());
        self.persist_state(&inner.state)
    }

    /// Persists or clears the active auction id, independently of tokens.
    pub fn set_active_item(&self, id: Option<i64>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.state.active_item_id = id;
        self.persist_state(&inner.state)
    }

    /// Wipes everything: session file fields and the refresh-token file.
    pub fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.state = SessionState::default();
        inner.refresh_token = None;
        self.persist_state(&inner.state)?;
        self.persist_refresh(None)
    }

    /// Returns the token pair, or `None` unless both halves are non-empty.
    pub fn tokens(&self) -> Option<TokenPair> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let access = inner.state.access_token.clone()?;
        let refresh = inner.refresh_token.clone()?;
        let pair = TokenPair::new(access, refresh);
        pair.is_valid().then_some(pair)
    }

    /// Returns the refresh token alone (read by the pipeline's 401 path).
    pub fn refresh_token(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.refresh_token.clone()
    }

    pub fn email(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.state.email.clone()
    }

    pub fn active_item(&self) -> Option<i64> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.state.active_item_id
    }

    fn persist_state(&self, state: &SessionState) -> Result<()> {
        let path = self.dir.join(SESSION_FILE);
        let contents =
            serde_json::to_string_pretty(state).context("Failed to serialize session state")?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write session to {}", path.display()))
    }

    fn persist_refresh(&self, token: Option<&str>) -> Result<()> {
        let path = self.dir.join(REFRESH_FILE);
        match token {
            Some(token) => {
                // Restricted permissions: the refresh token is the long-lived
                // credential.
                #[cfg(unix)]
                {
                    use std::os::unix::fs::OpenOptionsExt;
                    let mut file = OpenOptions::new()
                        .write(true)
                        .create(true)
                        .truncate(true)
                        .mode(0o600)
                        .open(&path)
                        .with_context(|| {
                            format!("Failed to open {} for writing", path.display())
                        })?;
                    file.write_all(token.as_bytes())
                        .with_context(|| format!("Failed to write to {}", path.display()))?;
                }
                #[cfg(not(unix))]
                {
                    fs::write(&path, token)
                        .with_context(|| format!("Failed to write to {}", path.display()))?;
                }
                Ok(())
            }
            None => {
                if path.exists() {
                    fs::remove_file(&path)
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_empty_dir_is_unauthenticated() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::open(temp.path()).unwrap();
        assert!(store.tokens().is_none());
        assert!(store.email().is_none());
        assert!(store.active_item().is_none());
    }

    #[test]
    fn test_set_tokens_persists_both_locations() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::open(temp.path()).unwrap();
        store
            .set_tokens(Some(&TokenPair::new("A1", "R1")))
            .unwrap();
        store.set_email("player@example.com").unwrap();

        let session = fs::read_to_string(temp.path().join(SESSION_FILE)).unwrap();
        assert!(session.contains("A1"));
        assert!(session.contains("player@example.com"));
        let refresh = fs::read_to_string(temp.path().join(REFRESH_FILE)).unwrap();
        assert_eq!(refresh, "R1");

        // Re-open restores the session.
        let reopened = SessionStore::open(temp.path()).unwrap();
        assert_eq!(reopened.tokens(), Some(TokenPair::new("A1", "R1")));
        assert_eq!(reopened.email().as_deref(), Some("player@example.com"));
    }

    #[test]
    fn test_missing_refresh_half_is_unauthenticated() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::open(temp.path()).unwrap();
        store
            .set_tokens(Some(&TokenPair::new("A1", "R1")))
            .unwrap();
        fs::remove_file(temp.path().join(REFRESH_FILE)).unwrap();

        let reopened = SessionStore::open(temp.path()).unwrap();
        assert!(reopened.tokens().is_none());
        // The access half alone must never look authenticated.
        assert!(reopened.refresh_token().is_none());
    }

    #[test]
    fn test_clear_removes_tokens_email_and_refresh_file() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::open(temp.path()).unwrap();
        store
            .set_tokens(Some(&TokenPair::new("A1", "R1")))
            .unwrap();
        store.set_email("player@example.com").unwrap();
        store.set_active_item(Some(42)).unwrap();

        store.clear().unwrap();
        assert!(store.tokens().is_none());
        assert!(store.email().is_none());
        assert!(store.active_item().is_none());
        assert!(!temp.path().join(REFRESH_FILE).exists());
    }

    #[test]
    fn test_active_item_independent_of_tokens() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::open(temp.path()).unwrap();
        store.set_active_item(Some(42)).unwrap();
        assert_eq!(store.active_item(), Some(42));
        assert!(store.tokens().is_none());

        store.set_active_item(None).unwrap();
        assert_eq!(store.active_item(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_refresh_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = SessionStore::open(temp.path()).unwrap();
        store
            .set_tokens(Some(&TokenPair::new("A1", "R1")))
            .unwrap();
        let mode = fs::metadata(temp.path().join(REFRESH_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
