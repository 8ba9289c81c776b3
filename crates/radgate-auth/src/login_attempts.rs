use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use time::OffsetDateTime;

const DEFAULT_WINDOW: StdDuration = StdDuration::from_secs(15 * 60);
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Sliding-window lockout per identifier (IP or username), spec §4.6.
/// Bounded, short-lived state — a plain `Mutex<HashMap<..>>`, not a
/// candidate for the `ArcSwap` snapshot idiom used by longer-lived
/// tables.
pub struct LoginAttemptTracker {
    window: StdDuration,
    max_attempts: u32,
    attempts: Mutex<HashMap<String, VecDeque<OffsetDateTime>>>,
}

impl Default for LoginAttemptTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_ATTEMPTS)
    }
}

impl LoginAttemptTracker {
    pub fn new(window: StdDuration, max_attempts: u32) -> Self {
        Self { window, max_attempts, attempts: Mutex::new(HashMap::new()) }
    }

    fn prune(&self, queue: &mut VecDeque<OffsetDateTime>, now: OffsetDateTime) {
        let cutoff = now - time::Duration::try_from(self.window).unwrap_or(time::Duration::ZERO);
        while let Some(front) = queue.front() {
            if *front < cutoff {
                queue.pop_front();
            } else {
                break;
            }
        }
    }

    /// `true` if `identifier` is currently locked out.
    pub fn is_locked_out(&self, identifier: &str) -> bool {
        let now = OffsetDateTime::now_utc();
        let mut guard = self.attempts.lock().expect("login attempt tracker lock poisoned");
        let queue = guard.entry(identifier.to_string()).or_default();
        self.prune(queue, now);
        queue.len() as u32 >= self.max_attempts
    }

    /// Records a failed attempt; call after authentication fails.
    pub fn record_failure(&self, identifier: &str) {
        let now = OffsetDateTime::now_utc();
        let mut guard = self.attempts.lock().expect("login attempt tracker lock poisoned");
        let queue = guard.entry(identifier.to_string()).or_default();
        self.prune(queue, now);
        queue.push_back(now);
    }

    /// Resets the identifier's window on successful login (spec §4.6).
    pub fn record_success(&self, identifier: &str) {
        let mut guard = self.attempts.lock().expect("login attempt tracker lock poisoned");
        guard.remove(identifier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_out_after_max_attempts() {
        let tracker = LoginAttemptTracker::new(StdDuration::from_secs(900), 3);
        assert!(!tracker.is_locked_out("user-a"));
        tracker.record_failure("user-a");
        tracker.record_failure("user-a");
        tracker.record_failure("user-a");
        assert!(tracker.is_locked_out("user-a"));
    }

    #[test]
    fn success_resets_the_window() {
        let tracker = LoginAttemptTracker::new(StdDuration::from_secs(900), 2);
        tracker.record_failure("user-b");
        tracker.record_failure("user-b");
        assert!(tracker.is_locked_out("user-b"));
        tracker.record_success("user-b");
        assert!(!tracker.is_locked_out("user-b"));
    }

    #[test]
    fn identifiers_are_independent() {
        let tracker = LoginAttemptTracker::new(StdDuration::from_secs(900), 1);
        tracker.record_failure("user-c");
        assert!(tracker.is_locked_out("user-c"));
        assert!(!tracker.is_locked_out("user-d"));
    }
}
