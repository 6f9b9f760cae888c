//! In-memory verification hash store.
//!
//! Backs the development publish endpoint: callers POST a hash under a UUID,
//! the issuer GETs it back once. A production caller publishes to a site it
//! controls instead; the protocol core only needs store-before-read ordering
//! and byte fidelity, which this store provides for tests and local demos.
//!
//! The store is capacity bounded. When full, the longest-stored entry is
//! evicted and its id is blocked from reuse, so an evicted or consumed id can
//! never be silently overwritten by another party.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::HashBackError, hash::HASH_LEN, Result};

/// Wire body for publishing a hash: `{"ID": "<uuid>", "Hash": "<base64>"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddHashBody {
    /// UUID identifying this hash; also embedded in the matching `VerifyUrl`.
    #[serde(rename = "ID")]
    pub id: String,
    /// Base64 of the 32-byte verification hash.
    #[serde(rename = "Hash")]
    pub hash: String,
}

/// Decodes a base64 hash string, requiring exactly 32 bytes.
#[must_use]
pub fn decode_hash(hash: &str) -> Option<[u8; HASH_LEN]> {
    let bytes =
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, hash).ok()?;
    bytes.try_into().ok()
}

/// A stored hash with its receive time.
#[derive(Debug, Clone)]
pub struct StoredHash {
    /// The 32-byte verification hash.
    pub hash: [u8; HASH_LEN],
    /// Unix seconds when the hash was stored.
    pub sent_at: i64,
}

impl StoredHash {
    /// The hash in its base64 transport form.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, self.hash)
    }
}

/// Ids that may no longer be used, bounded so the block list itself cannot
/// grow without limit. The longest-blocked id is forgotten first.
#[derive(Debug)]
struct UsedIds {
    set: HashSet<Uuid>,
    order: VecDeque<Uuid>,
    capacity: usize,
}

impl UsedIds {
    fn new(capacity: usize) -> Self {
        Self { set: HashSet::new(), order: VecDeque::new(), capacity }
    }

    fn add(&mut self, id: Uuid) {
        if self.set.insert(id) {
            self.order.push_back(id);
        }
        while self.set.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else { break };
            self.set.remove(&oldest);
        }
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.set.contains(id)
    }
}

#[derive(Debug)]
struct StoreInner {
    hashes: HashMap<Uuid, StoredHash>,
    order: VecDeque<Uuid>,
    used: UsedIds,
    capacity: usize,
}

/// Thread-safe, capacity-bounded hash store.
///
/// Cloning is cheap and shares the underlying storage.
///
/// # Examples
///
/// ```
/// use hashback_core::store::HashStore;
/// use uuid::Uuid;
///
/// let store = HashStore::new(100);
/// let id = Uuid::new_v4();
/// store.store(id, [7u8; 32], 1700000000).unwrap();
///
/// let record = store.take(&id).expect("stored hash should be retrievable");
/// assert_eq!(record.hash, [7u8; 32]);
///
/// // A hash is served once; the id is then blocked.
/// assert!(store.take(&id).is_none());
/// assert!(store.store(id, [7u8; 32], 1700000001).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct HashStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl HashStore {
    /// Creates a store holding at most `capacity` hashes. The blocked-id
    /// list is ten times that, matching the eviction horizon.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                hashes: HashMap::new(),
                order: VecDeque::new(),
                used: UsedIds::new(capacity.saturating_mul(10).max(1)),
                capacity: capacity.max(1),
            })),
        }
    }

    /// Stores a hash under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`HashBackError::InvalidRequest`] when the id is currently in
    /// use or was used before. Ids are single-use by design, matching the
    /// single-use nature of the request they verify.
    pub fn store(&self, id: Uuid, hash: [u8; HASH_LEN], sent_at: i64) -> Result<()> {
        let mut inner = self.lock();

        if inner.hashes.contains_key(&id) || inner.used.contains(&id) {
            return Err(HashBackError::InvalidRequest("hash ID is already in use".to_owned()));
        }

        inner.hashes.insert(id, StoredHash { hash, sent_at });
        inner.order.push_back(id);

        while inner.hashes.len() > inner.capacity {
            let Some(oldest) = inner.order.pop_front() else { break };
            inner.hashes.remove(&oldest);
            inner.used.add(oldest);
        }

        Ok(())
    }

    /// Returns and consumes the hash stored under `id`.
    ///
    /// The id is blocked afterwards, so the proof can be fetched exactly
    /// once.
    #[must_use]
    pub fn take(&self, id: &Uuid) -> Option<StoredHash> {
        let mut inner = self.lock();

        let record = inner.hashes.remove(id)?;
        inner.used.add(*id);
        Some(record)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself stays consistent, so recover the guard.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
