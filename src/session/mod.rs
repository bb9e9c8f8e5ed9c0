//! Session store — authentication state persisted across invocations.
//!
//! A session is the pair `{token, role}`: the bearer token returned by
//! `POST /auth/login` and the display-only role decoded from its claims.
//! It is written to `~/.mmpctl/session.json` synchronously with every
//! login/logout so a later invocation picks up (or loses) the session
//! accordingly — the durable local-storage analog of the platform UI.
//!
//! The store is an explicit value handed to whoever needs it; there is
//! no ambient global session.

pub mod token;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, LoginRequest, LoginResponse};
use crate::config::MmpConfig;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    /// Role label decoded from the token claims. Display-only — nothing
    /// in the client branches on it.
    pub role: String,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// File-backed session store.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Open the store at the default location (`~/.mmpctl/session.json`).
    pub fn open() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(Self::at(home.join(".mmpctl")))
    }

    /// Open a store rooted at an explicit state directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join("session.json"),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session, if any.
    ///
    /// A missing or malformed file reads as unauthenticated.
    pub fn load(&self) -> Option<Session> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Persist a session synchronously.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create state directory")?;
        }
        let json = serde_json::to_string_pretty(session).context("failed to serialize session")?;
        fs::write(&self.path, json).context("failed to write session file")?;
        Ok(())
    }

    /// Delete any persisted session unconditionally.
    ///
    /// An already-absent file is success.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("failed to remove session file"),
        }
    }
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

/// Authenticate against the backend and persist the resulting session.
///
/// Any non-2xx response (or transport failure) surfaces as the single
/// generic "invalid credentials" message, and the persisted state is
/// left untouched. On success the token's role claim is decoded
/// (display-only) and `{token, role}` is written before returning.
pub fn login(
    config: &MmpConfig,
    store: &SessionStore,
    email: &str,
    password: &str,
) -> Result<Session> {
    let client = ApiClient::from_config(config);
    let response: LoginResponse = client
        .post("/auth/login", &LoginRequest { email, password })
        .map_err(|_| anyhow::anyhow!("invalid credentials"))?;

    let role = token::role_claim(&response.access_token)
        .context("login succeeded but the token claims could not be decoded")?;

    let session = Session {
        token: response.access_token,
        role,
    };
    store.save(&session)?;

    Ok(session)
}

/// Clear all persisted session state, returning to unauthenticated.
pub fn logout(store: &SessionStore) -> Result<()> {
    store.clear()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());

        assert!(store.load().is_none());

        let session = Session {
            token: "a.b.c".to_string(),
            role: "admin".to_string(),
        };
        store.save(&session).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.token, "a.b.c");
        assert_eq!(loaded.role, "admin");

        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn malformed_session_file_reads_as_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(store.path(), "not json").unwrap();
        assert!(store.load().is_none());
    }
}
