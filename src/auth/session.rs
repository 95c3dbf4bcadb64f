//! In-memory session store shared across request workers.
//!
//! Tokens are opaque: 32 bytes from the thread-local CSPRNG, hex-encoded,
//! resolved by server-side lookup. Sessions live until explicit logout or
//! process restart; `created_at` is stored so an expiry sweep can be added
//! without changing the wire contract.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Metadata held per live token.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Concurrency-safe token -> session mapping, owned by the server state and
/// passed to handlers by reference rather than living at module level.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for the given user and register the session.
    pub async fn create(&self, username: &str) -> String {
        let token = generate_token();
        let session = Session {
            username: username.to_string(),
            created_at: Utc::now(),
        };
        self.sessions.write().await.insert(token.clone(), session);
        token
    }

    /// Resolve a token to its session, if the token is live.
    pub async fn lookup(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Remove a session. Revoking an absent token is a no-op; the returned
    /// bool reports whether anything was removed.
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// 256 bits of CSPRNG output, hex-encoded.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_lookup_resolves_username() {
        let store = SessionStore::new();
        let token = store.create("alice").await;
        let session = store.lookup(&token).await.expect("session");
        assert_eq!(session.username, "alice");
    }

    #[tokio::test]
    async fn lookup_of_unknown_token_is_none() {
        let store = SessionStore::new();
        assert!(store.lookup("deadbeef").await.is_none());
    }

    #[tokio::test]
    async fn revoke_removes_and_is_idempotent() {
        let store = SessionStore::new();
        let token = store.create("alice").await;
        assert!(store.revoke(&token).await);
        assert!(store.lookup(&token).await.is_none());
        // Second revoke is a no-op, not an error
        assert!(!store.revoke(&token).await);
    }

    #[tokio::test]
    async fn concurrent_sessions_do_not_collide() {
        let store = SessionStore::new();
        let t1 = store.create("alice").await;
        let t2 = store.create("alice").await;
        assert_ne!(t1, t2);
        assert_eq!(store.active_count().await, 2);
    }

    #[test]
    fn tokens_are_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
