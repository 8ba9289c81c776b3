use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    Active,
    Revoked,
    Expired,
}

/// Spec §3 `APIKey`. Never holds the raw key — only its SHA-256 hash
/// and an unpadded preview for display (`preview`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub id: String,
    pub workspace: String,
    pub name: String,
    pub hash: String,
    pub preview: String,
    pub status: ApiKeyStatus,
    /// `["*"]` allows every model.
    pub allowed_models: Vec<String>,
    /// `["*"]` allows every api_type.
    pub allowed_apis: Vec<String>,
    pub rate_limit: Option<u32>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_used_at: Option<OffsetDateTime>,
}

/// SHA-256 of the raw presented key, hex-encoded. Deterministic:
/// `hash_token(t1) == hash_token(t2) <=> t1 == t2` (spec §8).
pub fn hash_token(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// First 8 chars of the raw key plus an ellipsis, for display (spec §3).
pub fn preview_of(raw: &str) -> String {
    let head: String = raw.chars().take(8).collect();
    format!("{head}…")
}

fn allows(list: &[String], want: &str) -> bool {
    list.iter().any(|entry| entry == "*" || entry == want)
}

/// `ArcSwap`-backed snapshot, keyed by key hash — the same
/// single-writer/many-reader idiom `radgate-router::ModelRouter` uses.
pub struct ApiKeyStore {
    keys: ArcSwap<HashMap<String, ApiKeyRecord>>,
}

impl ApiKeyStore {
    pub fn new(keys: HashMap<String, ApiKeyRecord>) -> Self {
        Self { keys: ArcSwap::from_pointee(keys) }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    pub fn replace(&self, keys: HashMap<String, ApiKeyRecord>) {
        self.keys.store(Arc::new(keys));
    }

    pub fn insert(&self, record: ApiKeyRecord) {
        let mut next = (**self.keys.load()).clone();
        next.insert(record.hash.clone(), record);
        self.keys.store(Arc::new(next));
    }

    pub fn revoke(&self, hash: &str) {
        let mut next = (**self.keys.load()).clone();
        if let Some(rec) = next.get_mut(hash) {
            rec.status = ApiKeyStatus::Revoked;
        }
        self.keys.store(Arc::new(next));
    }

    /// Looks up by raw presented key, validates status/expiry/allow
    /// lists for `api_type`/`model` (spec §4.6).
    pub fn validate(&self, raw_key: &str, api_type: &str, model: &str) -> Result<ApiKeyRecord, AuthError> {
        let hash = hash_token(raw_key);
        let snapshot = self.keys.load();
        let record = snapshot.get(&hash).cloned().ok_or(AuthError::InvalidApiKey)?;

        if record.status != ApiKeyStatus::Active {
            return Err(AuthError::ApiKeyInactive);
        }
        if let Some(expires_at) = record.expires_at {
            if expires_at <= OffsetDateTime::now_utc() {
                return Err(AuthError::ApiKeyInactive);
            }
        }
        if !allows(&record.allowed_apis, api_type) {
            return Err(AuthError::ApiNotAllowed(api_type.to_string()));
        }
        if !allows(&record.allowed_models, model) {
            return Err(AuthError::ModelNotAllowed(model.to_string()));
        }
        Ok(record)
    }

    pub fn touch_last_used(&self, hash: &str) {
        let mut next = (**self.keys.load()).clone();
        if let Some(rec) = next.get_mut(hash) {
            rec.last_used_at = Some(OffsetDateTime::now_utc());
        }
        self.keys.store(Arc::new(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(hash: String, status: ApiKeyStatus, models: Vec<&str>, apis: Vec<&str>) -> ApiKeyRecord {
        ApiKeyRecord {
            id: "k1".into(),
            workspace: "w1".into(),
            name: "demo".into(),
            hash,
            preview: "rad_demo…".into(),
            status,
            allowed_models: models.into_iter().map(String::from).collect(),
            allowed_apis: apis.into_iter().map(String::from).collect(),
            rate_limit: None,
            expires_at: None,
            last_used_at: None,
        }
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_token("rad_demo"), hash_token("rad_demo"));
        assert_ne!(hash_token("rad_demo"), hash_token("rad_other"));
    }

    #[test]
    fn wildcard_allows_every_model() {
        let mut map = HashMap::new();
        let hash = hash_token("rad_demo");
        map.insert(hash.clone(), sample(hash, ApiKeyStatus::Active, vec!["*"], vec!["*"]));
        let store = ApiKeyStore::new(map);
        assert!(store.validate("rad_demo", "chat", "anything").is_ok());
    }

    #[test]
    fn empty_allowed_models_rejects_everything() {
        let mut map = HashMap::new();
        let hash = hash_token("rad_demo");
        map.insert(hash.clone(), sample(hash, ApiKeyStatus::Active, vec![], vec!["*"]));
        let store = ApiKeyStore::new(map);
        assert!(matches!(store.validate("rad_demo", "chat", "gpt-4o"), Err(AuthError::ModelNotAllowed(_))));
    }

    #[test]
    fn revoked_key_is_rejected() {
        let mut map = HashMap::new();
        let hash = hash_token("rad_demo");
        map.insert(hash.clone(), sample(hash, ApiKeyStatus::Revoked, vec!["*"], vec!["*"]));
        let store = ApiKeyStore::new(map);
        assert!(matches!(store.validate("rad_demo", "chat", "gpt-4o"), Err(AuthError::ApiKeyInactive)));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let store = ApiKeyStore::empty();
        assert!(matches!(store.validate("nope", "chat", "gpt-4o"), Err(AuthError::InvalidApiKey)));
    }
}
