//! Run-scoped memoization of discovery fetches.
//!
//! Every stage looks its input up here before touching the network. Keys carry
//! the kind of resource they name, so a domain and a URL that happen to be the
//! same string never share an entry. Each key owns a [`OnceCell`]: concurrent
//! lookups of the same key wait on a single in-flight fetch instead of racing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// What a cache key identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A bare hostname queried against the archive index
    Domain,
    /// An archived page scanned for script tags
    Page,
    /// A JavaScript asset whose source is mined
    Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ResourceKind,
    pub id: String,
}

impl CacheKey {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn domain(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::Domain, id)
    }

    pub fn page(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::Page, id)
    }

    pub fn asset(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::Asset, id)
    }
}

pub struct FetchCache<V> {
    entries: Mutex<HashMap<CacheKey, Arc<OnceCell<V>>>>,
}

impl<V: Clone> FetchCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stored result for `key`, if a fetch for it has completed.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let entries = self.entries.lock().await;
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Store `value` under `key`. The first stored value wins; later puts for
    /// the same key are ignored so a reader never sees an entry change.
    pub async fn put(&self, key: CacheKey, value: V) {
        let cell = self.cell(key).await;
        let _ = cell.set(value);
    }

    /// Return the stored result for `key`, running `fetch` only if no result
    /// exists yet. Concurrent callers for one key share a single `fetch`.
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = self.cell(key).await;
        cell.get_or_init(fetch).await.clone()
    }

    /// Number of keys holding a completed result.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // The map lock is only held long enough to find or insert the cell; the
    // fetch itself runs without it.
    async fn cell(&self, key: CacheKey) -> Arc<OnceCell<V>> {
        let mut entries = self.entries.lock().await;
        entries
            .entry(key)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}

impl<V: Clone> Default for FetchCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
