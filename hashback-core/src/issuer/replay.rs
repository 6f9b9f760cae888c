//! Replay detection for consumed nonces.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;

/// Records consumed `Unus` values so a verified request cannot be replayed.
///
/// Entries carry an expiry equal to the issuer's freshness window; once a
/// request would be rejected as stale anyway, its nonce no longer needs to
/// be remembered. The cache is additionally capacity bounded so the set
/// prunes itself rather than growing with traffic.
///
/// Cloning shares the underlying set, which is safe to use from many
/// concurrent verifications.
#[derive(Debug, Clone)]
pub struct ReplayGuard {
    seen: Arc<Mutex<LruCache<String, i64>>>,
    lifetime_secs: i64,
}

impl ReplayGuard {
    /// Creates a guard holding at most `capacity` nonces, each remembered
    /// for `lifetime_secs` after consumption.
    #[must_use]
    pub fn new(capacity: usize, lifetime_secs: i64) -> Self {
        let cap = NonZeroUsize::new(capacity)
            .unwrap_or(NonZeroUsize::new(1000).expect("1000 is non-zero"));
        Self { seen: Arc::new(Mutex::new(LruCache::new(cap))), lifetime_secs }
    }

    /// Consumes a nonce. Returns `false` when the nonce was already consumed
    /// within its lifetime, which the caller must treat as a replay.
    pub fn try_consume(&self, unus: &str, now: i64) -> bool {
        // A poisoned lock only means another thread panicked mid-insert;
        // the cache stays usable, so recover the guard.
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(&expires_at) = seen.peek(unus) {
            if expires_at > now {
                return false;
            }
        }

        seen.put(unus.to_owned(), now + self.lifetime_secs);
        true
    }
}
