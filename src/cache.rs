//! Bounded cache for `get_dataset` responses.
//!
//! Entries are keyed by the identity of the client that fetched them and the
//! dataset id. Attach one to a [`Client`](crate::Client) with
//! [`Client::with_dataset_cache`](crate::Client::with_dataset_cache); the
//! dataset endpoints then read through it and drop the entry for an id after
//! a successful create, delete or publish of that id.
//!
//! Every invalidation bumps a cache-wide generation. A fetch that started
//! before an invalidation is not written back, so a slow read cannot restore
//! the state a delete or publish just replaced.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::ClientId;
use crate::models::Dataset;
use crate::response::Response;

pub const DEFAULT_CAPACITY: usize = 128;

type Key = (ClientId, String);

#[derive(Debug)]
struct Entry {
    value: Arc<Response<Dataset>>,
    last_used: u64,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<Key, Entry>,
    tick: u64,
    generation: u64,
}

#[derive(Debug)]
pub struct DatasetCache {
    capacity: usize,
    state: Mutex<State>,
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DatasetCache {
    /// Creates a cache holding at most `capacity` responses (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(State::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, client: ClientId, dataset_id: &str) -> Option<Arc<Response<Dataset>>> {
        let mut state = self.state.lock();
        state.tick += 1;
        let tick = state.tick;
        let entry = state.entries.get_mut(&(client, dataset_id.to_string()))?;
        entry.last_used = tick;
        tracing::trace!(?client, dataset_id, "dataset cache hit");
        Some(Arc::clone(&entry.value))
    }

    /// Current generation; pass it to [`insert_if_current`](Self::insert_if_current)
    /// once the fetch it guards completes.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn insert(&self, client: ClientId, dataset_id: &str, value: Arc<Response<Dataset>>) {
        let mut state = self.state.lock();
        self.insert_locked(&mut state, client, dataset_id, value);
    }

    /// Inserts only if nothing was invalidated since `generation` was read.
    /// Returns whether the value was stored.
    pub fn insert_if_current(
        &self,
        client: ClientId,
        dataset_id: &str,
        value: Arc<Response<Dataset>>,
        generation: u64,
    ) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::trace!(?client, dataset_id, "dataset cache skip stale insert");
            return false;
        }
        self.insert_locked(&mut state, client, dataset_id, value);
        true
    }

    fn insert_locked(
        &self,
        state: &mut State,
        client: ClientId,
        dataset_id: &str,
        value: Arc<Response<Dataset>>,
    ) {
        state.tick += 1;
        let tick = state.tick;
        let key = (client, dataset_id.to_string());

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::trace!(client = ?oldest.0, dataset_id = %oldest.1, "dataset cache evict");
                state.entries.remove(&oldest);
            }
        }

        state.entries.insert(
            key,
            Entry {
                value,
                last_used: tick,
            },
        );
    }

    /// Drops the cached response for `dataset_id` fetched through `client`
    /// and bumps the generation. Returns whether an entry was present.
    pub fn invalidate(&self, client: ClientId, dataset_id: &str) -> bool {
        let mut state = self.state.lock();
        state.generation += 1;
        let removed = state
            .entries
            .remove(&(client, dataset_id.to_string()))
            .is_some();
        if removed {
            tracing::trace!(?client, dataset_id, "dataset cache invalidate");
        }
        removed
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Parsed;
    use bytes::Bytes;
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;

    fn cached(id: &str) -> Arc<Response<Dataset>> {
        let dataset: Dataset =
            serde_json::from_value(serde_json::json!({"id": id, "name": id})).unwrap();
        Arc::new(Response {
            status_code: StatusCode::OK,
            content: Bytes::new(),
            headers: HeaderMap::new(),
            parsed: Some(Parsed::Success(dataset)),
            url: format!("http://localhost/api/v1/datasets/{}", id),
        })
    }

    #[test]
    fn returns_same_instance() {
        let cache = DatasetCache::default();
        let c = ClientId::next();
        let v = cached("a");
        cache.insert(c, "a", Arc::clone(&v));
        assert!(Arc::ptr_eq(&cache.get(c, "a").unwrap(), &v));
    }

    #[test]
    fn keys_are_per_client() {
        let cache = DatasetCache::default();
        let (c1, c2) = (ClientId::next(), ClientId::next());
        cache.insert(c1, "a", cached("a"));
        assert!(cache.get(c1, "a").is_some());
        assert!(cache.get(c2, "a").is_none());
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = DatasetCache::new(2);
        let c = ClientId::next();
        cache.insert(c, "a", cached("a"));
        cache.insert(c, "b", cached("b"));
        // touch "a" so "b" becomes the eviction candidate
        assert!(cache.get(c, "a").is_some());
        cache.insert(c, "c", cached("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(c, "a").is_some());
        assert!(cache.get(c, "b").is_none());
        assert!(cache.get(c, "c").is_some());
    }

    #[test]
    fn replacing_an_entry_does_not_evict() {
        let cache = DatasetCache::new(2);
        let c = ClientId::next();
        cache.insert(c, "a", cached("a"));
        cache.insert(c, "b", cached("b"));
        cache.insert(c, "a", cached("a"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(c, "b").is_some());
    }

    #[test]
    fn insert_after_invalidation_is_skipped() {
        let cache = DatasetCache::default();
        let c = ClientId::next();
        let seen = cache.generation();
        // nothing cached yet; the invalidation still has to win
        assert!(!cache.invalidate(c, "a"));
        assert!(!cache.insert_if_current(c, "a", cached("a"), seen));
        assert!(cache.get(c, "a").is_none());

        let seen = cache.generation();
        assert!(cache.insert_if_current(c, "a", cached("a"), seen));
        assert!(cache.get(c, "a").is_some());
    }

    #[test]
    fn clear_also_bumps_generation() {
        let cache = DatasetCache::default();
        let seen = cache.generation();
        cache.clear();
        assert!(!cache.insert_if_current(ClientId::next(), "a", cached("a"), seen));
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = DatasetCache::new(0);
        assert_eq!(cache.capacity(), 1);
        let c = ClientId::next();
        cache.insert(c, "a", cached("a"));
        assert!(cache.invalidate(c, "a"));
        assert!(!cache.invalidate(c, "a"));
        assert!(cache.is_empty());

        cache.insert(c, "b", cached("b"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
