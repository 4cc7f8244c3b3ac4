//! Round-robin API credential rotation.
//!
//! Upstream quote APIs meter usage per key. The rotator cycles through
//! the configured keys so a rate limit on one key does not stall the
//! live tier while the others still have quota. An empty pool is a
//! first-class state: [`CredentialRotator::next`] returns `None` and
//! the caller skips the live tier instead of erroring.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{debug, warn};

/// Advisory cooldown recorded when a key reports a rate limit.
/// Upstream quotas are metered per minute.
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// One API key for the live quote provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub api_key: String,
}

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

/// Diagnostic view of one pool entry.
#[derive(Clone, Debug)]
pub struct CredentialStatus {
    pub masked_key: String,
    pub last_used: Option<Duration>,
    /// Remaining advisory cooldown after a rate-limit report.
    /// Informational only: rotation never skips a cooling credential.
    pub cooldown_remaining: Option<Duration>,
}

struct PoolEntry {
    credential: Credential,
    last_used: Option<Instant>,
    cooldown_until: Option<Instant>,
}

struct RotatorState {
    pool: Vec<PoolEntry>,
    cursor: usize,
}

/// Hands out credentials in strict round-robin order.
pub struct CredentialRotator {
    state: Mutex<RotatorState>,
}

impl CredentialRotator {
    pub fn new(api_keys: Vec<String>) -> Self {
        let pool = api_keys
            .into_iter()
            .map(|key| PoolEntry {
                credential: Credential::new(key),
                last_used: None,
                cooldown_until: None,
            })
            .collect();
        Self {
            state: Mutex::new(RotatorState { pool, cursor: 0 }),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RotatorState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Credential rotator mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Next credential in rotation, or `None` when the pool is empty.
    ///
    /// N consecutive calls on a pool of N distinct keys hand out each
    /// key exactly once.
    pub fn next(&self) -> Option<Credential> {
        let mut state = self.lock_state();
        if state.pool.is_empty() {
            return None;
        }

        let idx = state.cursor % state.pool.len();
        state.cursor = (idx + 1) % state.pool.len();

        let entry = &mut state.pool[idx];
        entry.last_used = Some(Instant::now());
        Some(entry.credential.clone())
    }

    /// Number of credentials in the pool.
    pub fn len(&self) -> usize {
        self.lock_state().pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().pool.is_empty()
    }

    /// Record an advisory cooldown for a key that just reported a rate
    /// limit. Rotation still hands the key out; the caller's own
    /// budget decides whether to retry it.
    pub fn note_rate_limit(&self, api_key: &str) {
        let mut state = self.lock_state();
        if let Some(entry) = state
            .pool
            .iter_mut()
            .find(|entry| entry.credential.api_key == api_key)
        {
            entry.cooldown_until = Some(Instant::now() + RATE_LIMIT_COOLDOWN);
            debug!("Credential {} cooling down", mask_key(api_key));
        }
    }

    /// Masked key, time since last use, and remaining cooldown for
    /// each pool entry.
    pub fn pool_status(&self) -> Vec<CredentialStatus> {
        let now = Instant::now();
        self.lock_state()
            .pool
            .iter()
            .map(|entry| CredentialStatus {
                masked_key: mask_key(&entry.credential.api_key),
                last_used: entry.last_used.map(|at| at.elapsed()),
                cooldown_remaining: entry
                    .cooldown_until
                    .and_then(|until| until.checked_duration_since(now)),
            })
            .collect()
    }
}

/// Mask an API key for logging. Keeps the first four characters.
pub fn mask_key(key: &str) -> String {
    if key.len() <= 4 {
        "***".to_string()
    } else {
        let prefix: String = key.chars().take(4).collect();
        format!("{prefix}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_cycles_in_order() {
        let rotator = CredentialRotator::new(vec![
            "key-one".to_string(),
            "key-two".to_string(),
            "key-three".to_string(),
        ]);

        let keys: Vec<String> = (0..6)
            .filter_map(|_| rotator.next().map(|c| c.api_key))
            .collect();
        assert_eq!(
            keys,
            vec!["key-one", "key-two", "key-three", "key-one", "key-two", "key-three"]
        );
    }

    #[test]
    fn test_full_cycle_hands_out_each_key_once() {
        let rotator = CredentialRotator::new(vec![
            "aaaa1111".to_string(),
            "bbbb2222".to_string(),
            "cccc3333".to_string(),
        ]);

        let mut seen: Vec<String> = (0..rotator.len())
            .filter_map(|_| rotator.next().map(|c| c.api_key))
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["aaaa1111", "bbbb2222", "cccc3333"]);
    }

    #[test]
    fn test_empty_pool_returns_none() {
        let rotator = CredentialRotator::new(Vec::new());
        assert!(rotator.next().is_none());
        assert!(rotator.is_empty());
        assert_eq!(rotator.len(), 0);
    }

    #[test]
    fn test_single_key_repeats() {
        let rotator = CredentialRotator::new(vec!["only-key".to_string()]);
        assert_eq!(rotator.next().map(|c| c.api_key), Some("only-key".into()));
        assert_eq!(rotator.next().map(|c| c.api_key), Some("only-key".into()));
    }

    #[test]
    fn test_pool_status_tracks_usage() {
        let rotator =
            CredentialRotator::new(vec!["aaaa1111".to_string(), "bbbb2222".to_string()]);

        let status = rotator.pool_status();
        assert_eq!(status.len(), 2);
        assert!(status.iter().all(|s| s.last_used.is_none()));

        rotator.next();
        let status = rotator.pool_status();
        assert!(status[0].last_used.is_some());
        assert!(status[1].last_used.is_none());
    }

    #[test]
    fn test_pool_status_masks_keys() {
        let rotator = CredentialRotator::new(vec!["supersecretkey".to_string()]);
        let status = rotator.pool_status();
        assert_eq!(status[0].masked_key, "supe...");
        assert!(!status[0].masked_key.contains("secret"));
    }

    #[test]
    fn test_rate_limit_report_sets_advisory_cooldown() {
        let rotator =
            CredentialRotator::new(vec!["aaaa1111".to_string(), "bbbb2222".to_string()]);
        rotator.note_rate_limit("aaaa1111");

        let status = rotator.pool_status();
        let remaining = status[0].cooldown_remaining.unwrap();
        assert!(remaining <= RATE_LIMIT_COOLDOWN);
        assert!(status[1].cooldown_remaining.is_none());
    }

    #[test]
    fn test_cooling_credential_is_still_handed_out() {
        let rotator =
            CredentialRotator::new(vec!["aaaa1111".to_string(), "bbbb2222".to_string()]);
        rotator.note_rate_limit("aaaa1111");

        let keys: Vec<String> = (0..2)
            .filter_map(|_| rotator.next().map(|c| c.api_key))
            .collect();
        assert_eq!(keys, vec!["aaaa1111", "bbbb2222"]);
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abcdefgh"), "abcd...");
        assert_eq!(mask_key("abcd"), "***");
        assert_eq!(mask_key(""), "***");
    }
}
