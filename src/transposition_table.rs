use parking_lot::Mutex;

use std::collections::hash_map::{self, HashMap};
use std::sync::Arc;

use crate::canonical::CanonicalKey;

/// How a stored score relates to the true value of the position
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    // the search failed high, the true value is at least the score
    Lower,
    // the search failed low, the true value is at most the score
    Upper,
}

/// A search result, scored for the side to move of the keyed position
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub score: i32,
    /// remaining search depth the score was computed with
    pub depth: u8,
    pub bound: Bound,
}

impl Entry {
    /// Depth given to values loaded from a persisted table
    ///
    /// Persisted values may be horizon estimates, so they only stand in for
    /// playouts and never for a search with depth remaining.
    pub const SEEDED_DEPTH: u8 = 0;

    pub fn new(score: i32, depth: u8, bound: Bound) -> Self {
        Self {
            score,
            depth,
            bound,
        }
    }

    pub fn seeded(score: i32) -> Self {
        Self::new(score, Self::SEEDED_DEPTH, Bound::Exact)
    }

    // shallower results never overwrite deeper ones
    fn replaces(&self, existing: &Entry) -> bool {
        self.depth >= existing.depth
    }
}

/// Storage for search results keyed by canonical position
pub trait Cache {
    fn get(&self, key: &CanonicalKey) -> Option<Entry>;
    fn set(&mut self, key: CanonicalKey, entry: Entry);
}

#[derive(Clone, Debug, Default)]
pub struct TranspositionTable {
    entries: HashMap<CanonicalKey, Entry>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> hash_map::Iter<'_, CanonicalKey, Entry> {
        self.entries.iter()
    }
}

impl Cache for TranspositionTable {
    fn get(&self, key: &CanonicalKey) -> Option<Entry> {
        self.entries.get(key).copied()
    }

    fn set(&mut self, key: CanonicalKey, entry: Entry) {
        match self.entries.entry(key) {
            hash_map::Entry::Occupied(mut occupied) => {
                if entry.replaces(occupied.get()) {
                    occupied.insert(entry);
                }
            }
            hash_map::Entry::Vacant(vacant) => {
                vacant.insert(entry);
            }
        }
    }
}

const SHARD_COUNT: usize = 64;

/// A [`TranspositionTable`] that can be shared between search threads
///
/// Clones refer to the same storage. Every write of a key and its entry happens
/// under the lock of one shard.
#[derive(Clone)]
pub struct SharedTranspositionTable {
    shards: Arc<Vec<Mutex<HashMap<CanonicalKey, Entry>>>>,
}

impl SharedTranspositionTable {
    pub fn new() -> Self {
        let mut shards = Vec::with_capacity(SHARD_COUNT);
        for _ in 0..SHARD_COUNT {
            shards.push(Mutex::new(HashMap::new()));
        }
        Self {
            shards: Arc::new(shards),
        }
    }

    fn shard(&self, key: &CanonicalKey) -> &Mutex<HashMap<CanonicalKey, Entry>> {
        // fibonacci hashing, top 6 bits pick the shard
        let hash = (key.player_one_mask() ^ key.player_two_mask().rotate_left(32))
            .wrapping_mul(0x9e37_79b9_7f4a_7c15);
        &self.shards[(hash >> 58) as usize % SHARD_COUNT]
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the current contents into a single-threaded table
    pub fn to_table(&self) -> TranspositionTable {
        let mut entries = HashMap::new();
        for shard in self.shards.iter() {
            entries.extend(shard.lock().iter().map(|(key, entry)| (*key, *entry)));
        }
        TranspositionTable { entries }
    }
}

impl Default for SharedTranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl From<TranspositionTable> for SharedTranspositionTable {
    fn from(table: TranspositionTable) -> Self {
        let mut shared = Self::new();
        for (key, entry) in table.entries {
            shared.set(key, entry);
        }
        shared
    }
}

impl Cache for SharedTranspositionTable {
    fn get(&self, key: &CanonicalKey) -> Option<Entry> {
        self.shard(key).lock().get(key).copied()
    }

    fn set(&mut self, key: CanonicalKey, entry: Entry) {
        let mut shard = self.shard(&key).lock();
        let replace = shard
            .get(&key)
            .map_or(true, |existing| entry.replaces(existing));
        if replace {
            shard.insert(key, entry);
        }
    }
}
