use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::RngCore;
use time::{Duration, OffsetDateTime};

use crate::error::OAuthError;
use crate::provider::OAuthProvider;
use crate::session::{Session, SessionStatus};
use radgate_common::new_request_id;

/// Pending sessions auto-expire after 10 minutes (spec §3/§4.8).
pub const DEFAULT_PENDING_TTL: Duration = Duration::minutes(10);

pub(crate) fn random_token() -> String {
    let mut bytes = [0u8; 24];
    rand::rng().fill_bytes(&mut bytes);
    base64_url(&bytes)
}

fn base64_url(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

struct Inner {
    sessions: HashMap<String, Session>,
    by_state: HashMap<String, String>,
}

/// State table `sessions[id]` plus `by_state[state] -> id` index (spec
/// §4.8), single `Mutex`, held only across short in-memory operations
/// (provider calls happen outside the lock).
pub struct OAuthManager {
    inner: Mutex<Inner>,
    providers: HashMap<String, Arc<dyn OAuthProvider>>,
    pending_ttl: Duration,
}

impl OAuthManager {
    pub fn new(providers: Vec<Arc<dyn OAuthProvider>>) -> Self {
        let providers = providers.into_iter().map(|p| (p.name().to_string(), p)).collect();
        Self {
            inner: Mutex::new(Inner { sessions: HashMap::new(), by_state: HashMap::new() }),
            providers,
            pending_ttl: DEFAULT_PENDING_TTL,
        }
    }

    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    fn provider(&self, name: &str) -> Result<&Arc<dyn OAuthProvider>, OAuthError> {
        self.providers.get(name).ok_or_else(|| OAuthError::UnknownProvider(name.to_string()))
    }

    /// Creates a pending session and returns its `auth_url` (spec
    /// §4.8). The `state` parameter is random and serves as the
    /// `by_state` index key.
    pub fn start(&self, provider: &str, redirect_uri: &str) -> Result<Session, OAuthError> {
        let adapter = self.provider(provider)?;
        let state = random_token();
        let auth_url = adapter.auth_url(redirect_uri, &state);
        let now = OffsetDateTime::now_utc();
        let session = Session {
            id: new_request_id(),
            provider: provider.to_string(),
            state: state.clone(),
            auth_url,
            status: SessionStatus::Pending,
            token: None,
            created_at: now,
            updated_at: now,
            redirect_uri: redirect_uri.to_string(),
            error: None,
        };

        let mut guard = self.inner.lock().expect("oauth manager lock poisoned");
        guard.by_state.insert(state, session.id.clone());
        guard.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    /// Validates provider match, non-expiry, and a non-empty code,
    /// exchanges it via the provider, and transitions the session to
    /// `connected` (spec §4.8). The state index entry is deleted
    /// either way once resolved.
    pub async fn complete(&self, provider: &str, state: &str, code: &str) -> Result<Session, OAuthError> {
        if code.is_empty() {
            return Err(OAuthError::InvalidCode);
        }
        let adapter = self.provider(provider)?;

        let session_id = {
            let guard = self.inner.lock().expect("oauth manager lock poisoned");
            guard.by_state.get(state).cloned().ok_or(OAuthError::UnknownSession)?
        };

        let redirect_uri = {
            let mut guard = self.inner.lock().expect("oauth manager lock poisoned");
            let session = guard.sessions.get_mut(&session_id).ok_or(OAuthError::UnknownSession)?;
            if session.provider != provider {
                return Err(OAuthError::StateMismatch);
            }
            if session.is_pending_expired(self.pending_ttl) {
                session.status = SessionStatus::Expired;
                guard.by_state.remove(state);
                return Err(OAuthError::SessionExpired);
            }
            session.redirect_uri.clone()
        };

        let outcome = adapter.exchange_code(&redirect_uri, code).await;

        let mut guard = self.inner.lock().expect("oauth manager lock poisoned");
        guard.by_state.remove(state);
        let session = guard.sessions.get_mut(&session_id).ok_or(OAuthError::UnknownSession)?;
        match outcome {
            Ok(token) => {
                session.status = SessionStatus::Connected;
                session.token = Some(token);
                session.error = None;
            }
            Err(err) => {
                session.status = SessionStatus::Failed;
                session.error = Some(err.to_string());
                session.updated_at = OffsetDateTime::now_utc();
                return Err(err);
            }
        }
        session.updated_at = OffsetDateTime::now_utc();
        Ok(session.clone())
    }

    /// Calls the provider and updates whichever in-memory session's
    /// refresh token matches (spec §4.8).
    pub async fn refresh(&self, provider: &str, refresh_token: &str) -> Result<Session, OAuthError> {
        let adapter = self.provider(provider)?;

        let session_id = {
            let guard = self.inner.lock().expect("oauth manager lock poisoned");
            guard
                .sessions
                .values()
                .find(|s| s.provider == provider && s.token.as_ref().and_then(|t| t.refresh_token.as_deref()) == Some(refresh_token))
                .map(|s| s.id.clone())
                .ok_or(OAuthError::InvalidRefreshToken)?
        };

        let token = adapter.refresh(refresh_token).await?;

        let mut guard = self.inner.lock().expect("oauth manager lock poisoned");
        let session = guard.sessions.get_mut(&session_id).ok_or(OAuthError::UnknownSession)?;
        session.token = Some(token);
        session.status = SessionStatus::Connected;
        session.updated_at = OffsetDateTime::now_utc();
        Ok(session.clone())
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.inner.lock().expect("oauth manager lock poisoned").sessions.get(id).cloned()
    }

    /// Evicts all expired sessions and their state indices (spec
    /// §4.8). Intended to run from a background janitor on an
    /// interval, mirroring the KeyRotator's interval-task idiom.
    pub fn cleanup_expired(&self) -> usize {
        let mut guard = self.inner.lock().expect("oauth manager lock poisoned");
        let pending_ttl = self.pending_ttl;
        let expired_ids: Vec<String> = guard
            .sessions
            .values()
            .filter(|s| s.is_pending_expired(pending_ttl) || s.is_connected_expired())
            .map(|s| s.id.clone())
            .collect();

        for id in &expired_ids {
            if let Some(session) = guard.sessions.get_mut(id) {
                session.status = SessionStatus::Expired;
                guard.by_state.retain(|_, sid| sid != id);
            }
        }
        expired_ids.len()
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().expect("oauth manager lock poisoned").sessions.len()
    }

    /// Spawns the background janitor task on `interval` (spec §4.8,
    /// §5's "OAuth session janitor" background task).
    pub fn spawn_janitor(self: &Arc<Self>, interval: std::time::Duration) {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = manager.cleanup_expired();
                if evicted > 0 {
                    tracing::debug!(evicted, "oauth janitor evicted expired sessions");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;

    fn manager() -> OAuthManager {
        OAuthManager::new(vec![Arc::new(StaticProvider::new("github"))])
    }

    #[test]
    fn start_creates_pending_session_indexed_by_state() {
        let mgr = manager();
        let session = mgr.start("github", "https://app.example/cb").unwrap();
        assert_eq!(session.status, SessionStatus::Pending);
        assert!(session.auth_url.contains(&session.state));
    }

    #[test]
    fn start_unknown_provider_errors() {
        let mgr = manager();
        assert!(matches!(mgr.start("bogus", "https://app.example/cb"), Err(OAuthError::UnknownProvider(_))));
    }

    #[tokio::test]
    async fn complete_transitions_to_connected_and_clears_state_index() {
        let mgr = manager();
        let session = mgr.start("github", "https://app.example/cb").unwrap();
        let completed = mgr.complete("github", &session.state, "auth-code-123").await.unwrap();
        assert_eq!(completed.status, SessionStatus::Connected);
        assert!(completed.token.is_some());

        // state index was deleted; a retry with the same state is unknown.
        assert!(matches!(mgr.complete("github", &session.state, "auth-code-123").await, Err(OAuthError::UnknownSession)));
    }

    #[tokio::test]
    async fn complete_with_empty_code_is_rejected() {
        let mgr = manager();
        let session = mgr.start("github", "https://app.example/cb").unwrap();
        assert!(matches!(mgr.complete("github", &session.state, "").await, Err(OAuthError::InvalidCode)));
    }

    #[tokio::test]
    async fn complete_rejects_provider_mismatch() {
        let mgr = OAuthManager::new(vec![Arc::new(StaticProvider::new("github")), Arc::new(StaticProvider::new("google"))]);
        let session = mgr.start("github", "https://app.example/cb").unwrap();
        assert!(matches!(mgr.complete("google", &session.state, "code").await, Err(OAuthError::StateMismatch)));
    }

    #[tokio::test]
    async fn expired_pending_session_rejected_on_complete() {
        let mgr = OAuthManager::new(vec![Arc::new(StaticProvider::new("github"))]).with_pending_ttl(Duration::seconds(0));
        let session = mgr.start("github", "https://app.example/cb").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(matches!(mgr.complete("github", &session.state, "code").await, Err(OAuthError::SessionExpired)));
    }

    #[tokio::test]
    async fn refresh_updates_matching_session() {
        let mgr = manager();
        let session = mgr.start("github", "https://app.example/cb").unwrap();
        let connected = mgr.complete("github", &session.state, "auth-code").await.unwrap();
        let refresh_token = connected.token.clone().unwrap().refresh_token.unwrap();

        let refreshed = mgr.refresh("github", &refresh_token).await.unwrap();
        assert_eq!(refreshed.id, connected.id);
        assert_eq!(refreshed.status, SessionStatus::Connected);
    }

    #[test]
    fn cleanup_expired_evicts_stale_pending_sessions() {
        let mgr = OAuthManager::new(vec![Arc::new(StaticProvider::new("github"))]).with_pending_ttl(Duration::seconds(0));
        mgr.start("github", "https://app.example/cb").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let evicted = mgr.cleanup_expired();
        assert_eq!(evicted, 1);
    }
}
