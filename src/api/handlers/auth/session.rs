//! Session registry and the cookie that carries its key.

use anyhow::Result;
use async_trait::async_trait;
use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub(crate) const SESSION_COOKIE_NAME: &str = "gatekeep_session";

/// Server-side state for one logged-in user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at_unix: i64,
}

/// Backend for session records, keyed by the opaque session token.
///
/// Handlers only see this trait, so the in-memory default can be replaced by a
/// persistent or shared backend.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, token: &str) -> Result<Option<SessionRecord>>;

    async fn put(&self, token: String, record: SessionRecord) -> Result<()>;

    /// Remove a session, returning the record if it existed.
    async fn delete(&self, token: &str) -> Result<Option<SessionRecord>>;
}

/// Process-lifetime session map. Entries are never evicted.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, token: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn put(&self, token: String, record: SessionRecord) -> Result<()> {
        self.sessions.write().await.insert(token, record);
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.write().await.remove(token))
    }
}

/// Build the `HttpOnly` cookie for the session token.
///
/// No `Max-Age`: sessions do not expire, so the cookie lives for the browser session.
pub(crate) fn session_cookie(token: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| key.trim() == SESSION_COOKIE_NAME && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
}
