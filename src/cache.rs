//! The fetched-collection cache.
//!
//! Holds the last collection fetched for each [`CollectionKey`] along with when it was fetched.
//! An entry is fresh until it is older than the configured staleness window or until something
//! invalidates it (usually a [`crate::mutation::Mutation`] that succeeded). Stale entries are
//! still served by [`CollectionCache::get`], but [`CollectionCache::get_or_fetch`] refetches them.

use crate::error::{ErrorType, IntoResult, Res};
use crate::model::parse_collection;
use crate::{utils, Result};
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// The logical keys under which backend collections are cached.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKey {
    Productos,
    Compras,
    Ventas,
    Proveedores,
    Alertas,
}

serde_plain::derive_display_from_serialize!(CollectionKey);
serde_plain::derive_fromstr_from_deserialize!(CollectionKey);

impl CollectionKey {
    /// The snapshot file name for this collection, e.g. `proveedores.json`.
    pub fn file_name(self) -> String {
        format!("{self}.json")
    }
}

/// Something that can produce the raw body of a collection.
#[async_trait]
pub trait Source: Send + Sync {
    async fn fetch(&self, key: CollectionKey) -> anyhow::Result<String>;
}

/// Reads collection snapshots from `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Source for FileSource {
    async fn fetch(&self, key: CollectionKey) -> anyhow::Result<String> {
        let path = self.dir.join(key.file_name());
        debug!("Reading the {key} snapshot from {}", path.display());
        utils::read(&path)
            .await
            .with_context(|| format!("No {key} snapshot is available"))
    }
}

/// Marks cached collections as needing a refetch.
pub trait Invalidate {
    fn invalidate(&mut self, key: CollectionKey);
}

struct Entry {
    data: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    stale: bool,
}

/// The last-known collection per key, with freshness metadata.
pub struct CollectionCache {
    entries: HashMap<CollectionKey, Entry>,
    stale_after: Duration,
}

impl CollectionCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stale_after,
        }
    }

    /// Stores `items` as the current collection for `key` and returns the shared copy.
    pub fn insert<I>(&mut self, key: CollectionKey, items: Vec<I>) -> Arc<Vec<I>>
    where
        I: Send + Sync + 'static,
    {
        let items = Arc::new(items);
        let data: Arc<dyn Any + Send + Sync> = Arc::clone(&items) as _;
        let _ = self.entries.insert(
            key,
            Entry {
                data,
                fetched_at: Instant::now(),
                stale: false,
            },
        );
        items
    }

    /// The cached collection for `key`, fresh or not. `None` if nothing is cached or it was cached
    /// as a different item type.
    pub fn get<I>(&self, key: CollectionKey) -> Option<Arc<Vec<I>>>
    where
        I: Send + Sync + 'static,
    {
        let entry = self.entries.get(&key)?;
        Arc::clone(&entry.data).downcast::<Vec<I>>().ok()
    }

    pub fn contains(&self, key: CollectionKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Whether `key` is cached, has not been invalidated and is within the staleness window.
    pub fn is_fresh(&self, key: CollectionKey) -> bool {
        self.entries
            .get(&key)
            .map(|e| !e.stale && e.fetched_at.elapsed() < self.stale_after)
            .unwrap_or(false)
    }

    /// The cached collection if it is fresh, otherwise fetches and caches it first.
    pub async fn get_or_fetch<I>(
        &mut self,
        key: CollectionKey,
        source: &dyn Source,
    ) -> Result<Arc<Vec<I>>>
    where
        I: DeserializeOwned + Send + Sync + 'static,
    {
        if self.is_fresh(key) {
            if let Some(items) = self.get::<I>(key) {
                debug!("Using the cached {key} collection");
                return Ok(items);
            }
        }
        let body = source.fetch(key).await.pub_result(ErrorType::Io)?;
        let items = parse(key, &body).pub_result(ErrorType::Input)?;
        debug!("Fetched {} {key}", items.len());
        Ok(self.insert(key, items))
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        debug!("Clearing {} cached collections", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse<I: DeserializeOwned>(key: CollectionKey, body: &str) -> Res<Vec<I>> {
    parse_collection(body).with_context(|| format!("The {key} snapshot is malformed"))
}

impl Invalidate for CollectionCache {
    fn invalidate(&mut self, key: CollectionKey) {
        if let Some(entry) = self.entries.get_mut(&key) {
            debug!("Invalidating the cached {key} collection");
            entry.stale = true;
        }
    }
}

impl std::fmt::Debug for CollectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("CollectionCache")
            .field("keys", &keys)
            .field("stale_after", &self.stale_after)
            .finish()
    }
}
