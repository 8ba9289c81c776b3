use std::sync::RwLock;
use std::time::Duration as StdDuration;

use time::{Duration, OffsetDateTime};

const DEFAULT_GRACE: StdDuration = StdDuration::from_secs(24 * 60 * 60);
const DEFAULT_RETAIN: usize = 3;

/// A single signing key with a lifecycle (spec §3/§4.6). At most one
/// version is `active` (current, used for signing); verification
/// tries every non-expired version.
#[derive(Debug, Clone)]
pub struct KeyVersion {
    pub version: u32,
    pub secret: String,
    pub created_at: OffsetDateTime,
    pub expires_at: Option<OffsetDateTime>,
    pub active: bool,
}

impl KeyVersion {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Owns the versioned signing-key set (spec §4.6/§5): single RW lock,
/// single writer (`rotate`), many concurrent readers (`current`/
/// `verifiable`). Never held across network I/O — all operations here
/// are pure in-memory bookkeeping.
pub struct KeyRotator {
    versions: RwLock<Vec<KeyVersion>>,
    grace: StdDuration,
    retain: usize,
}

impl KeyRotator {
    pub fn new(initial_secret: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            versions: RwLock::new(vec![KeyVersion {
                version: 1,
                secret: initial_secret.into(),
                created_at: now,
                expires_at: None,
                active: true,
            }]),
            grace: DEFAULT_GRACE,
            retain: DEFAULT_RETAIN,
        }
    }

    pub fn with_grace(mut self, grace: StdDuration) -> Self {
        self.grace = grace;
        self
    }

    pub fn with_retain(mut self, retain: usize) -> Self {
        self.retain = retain.max(1);
        self
    }

    /// Preloads additional versions, e.g. from `JWT_ACCESS_SECRET_V{N}`
    /// env vars at boot — they verify but never sign until rotated in.
    pub fn preload(&self, version: u32, secret: impl Into<String>) {
        let mut guard = self.versions.write().expect("key rotator lock poisoned");
        guard.push(KeyVersion {
            version,
            secret: secret.into(),
            created_at: OffsetDateTime::now_utc(),
            expires_at: None,
            active: false,
        });
    }

    /// The current signing key. Signing always uses this one (spec §4.6).
    pub fn current(&self) -> KeyVersion {
        let guard = self.versions.read().expect("key rotator lock poisoned");
        guard
            .iter()
            .filter(|v| v.active)
            .max_by_key(|v| v.version)
            .cloned()
            .or_else(|| guard.iter().max_by_key(|v| v.version).cloned())
            .expect("key rotator always has at least one version")
    }

    /// Every version eligible to verify against, newest-first, subject
    /// to the "stop on first success" policy the caller implements.
    pub fn verifiable(&self) -> Vec<KeyVersion> {
        let now = OffsetDateTime::now_utc();
        let guard = self.versions.read().expect("key rotator lock poisoned");
        let mut versions: Vec<KeyVersion> = guard.iter().filter(|v| !v.is_expired(now)).cloned().collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        versions
    }

    /// Creates a new signing version, demotes the previous active
    /// version to a grace-period expiry, and evicts anything beyond
    /// `retain` versions (spec §4.6).
    pub fn rotate(&self, new_secret: impl Into<String>) -> KeyVersion {
        let now = OffsetDateTime::now_utc();
        let mut guard = self.versions.write().expect("key rotator lock poisoned");

        let next_version = guard.iter().map(|v| v.version).max().unwrap_or(0) + 1;
        for v in guard.iter_mut().filter(|v| v.active) {
            v.active = false;
            v.expires_at = Some(now + Duration::try_from(self.grace).unwrap_or(Duration::hours(24)));
        }

        let created = KeyVersion {
            version: next_version,
            secret: new_secret.into(),
            created_at: now,
            expires_at: None,
            active: true,
        };
        guard.push(created.clone());

        guard.sort_by(|a, b| a.version.cmp(&b.version));
        if guard.len() > self.retain {
            let drop_count = guard.len() - self.retain;
            guard.drain(0..drop_count);
        }

        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_with_current_version() {
        let rotator = KeyRotator::new("s1");
        assert_eq!(rotator.current().version, 1);
    }

    #[test]
    fn rotation_demotes_old_version_with_grace() {
        let rotator = KeyRotator::new("s1").with_grace(StdDuration::from_secs(3600));
        rotator.rotate("s2");
        assert_eq!(rotator.current().version, 2);
        let verifiable = rotator.verifiable();
        assert_eq!(verifiable.len(), 2);
        assert!(verifiable.iter().any(|v| v.version == 1 && v.expires_at.is_some()));
    }

    #[test]
    fn retains_only_last_n_versions() {
        let rotator = KeyRotator::new("s1").with_retain(2).with_grace(StdDuration::from_secs(3600));
        rotator.rotate("s2");
        rotator.rotate("s3");
        assert_eq!(rotator.verifiable().len(), 2);
    }
}
