//! Cross-reference map from archive buckets to their hrefs.
//!
//! ```text
//! siteMap
//! ├── category
//! │   ├── rust   → category/rust
//! │   └── travel → category/travel
//! └── home
//!     └── all    → index.html
//! ```
//!
//! Every generated and passed-through file carries a [`SiteMapHandle`] to the
//! same cell. The press builds the map while packing archives and publishes
//! it exactly once, before any file leaves the stage; after that the map is
//! read-only. Reading a handle before publication yields no map, which
//! serializes as an empty object.

use crate::ordered::OrderedMap;
use serde::{Serialize, Serializer};
use std::sync::{Arc, OnceLock};

/// Archive type → bucket key → href.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SiteMap {
    types: OrderedMap<OrderedMap<String>>,
}

impl SiteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an (initially empty) entry for an archive type.
    pub fn add_type(&mut self, archive: &str) {
        self.types.get_or_insert_with(archive, OrderedMap::new);
    }

    /// Record the href for one bucket, creating the type entry if needed.
    pub fn record(&mut self, archive: &str, key: &str, href: impl Into<String>) {
        self.types
            .get_or_insert_with(archive, OrderedMap::new)
            .insert(key, href.into());
    }

    pub fn href(&self, archive: &str, key: &str) -> Option<&str> {
        self.types
            .get(archive)
            .and_then(|buckets| buckets.get(key))
            .map(String::as_str)
    }

    pub fn archive(&self, archive: &str) -> Option<&OrderedMap<String>> {
        self.types.get(archive)
    }

    pub fn archives(&self) -> impl Iterator<Item = (&str, &OrderedMap<String>)> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Shared, publish-once reference to the run's [`SiteMap`].
#[derive(Debug, Clone, Default)]
pub struct SiteMapHandle {
    cell: Arc<OnceLock<SiteMap>>,
}

impl SiteMapHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The published map, or `None` while archives are still being packed.
    pub fn get(&self) -> Option<&SiteMap> {
        self.cell.get()
    }

    pub fn is_published(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Publish the finished map. Fails with the rejected map if a map was
    /// already published through any clone of this handle.
    pub(crate) fn publish(&self, map: SiteMap) -> Result<(), SiteMap> {
        self.cell.set(map)
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &SiteMapHandle) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Serialize for SiteMapHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.get() {
            Some(map) => map.serialize(serializer),
            None => SiteMap::new().serialize(serializer),
        }
    }
}
