//! Catalog lookup - the read-only menu price collaborator
//!
//! The revision core only ever asks one question of the catalog: what does
//! item X look like right now. The seam is a trait so the in-memory store can
//! be swapped for whatever the deployment actually feeds from.

use parking_lot::RwLock;
use shared::catalog::CatalogItem;
use std::collections::HashMap;
use std::path::Path;

/// Read-only price lookup keyed by catalog item id
pub trait CatalogStore: Send + Sync {
    fn get_item(&self, id: &str) -> Option<CatalogItem>;
}

/// In-memory catalog, loadable from a JSON array of items
///
/// Replaceable at runtime; lookups clone the item so callers never hold the
/// lock across pricing work.
#[derive(Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<String, CatalogItem>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON file containing `[CatalogItem, ...]`
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let items: Vec<CatalogItem> = serde_json::from_str(&raw)?;
        tracing::info!(count = items.len(), "Catalog loaded");
        let catalog = Self::new();
        catalog.replace(items);
        Ok(catalog)
    }

    /// Replace the whole catalog
    pub fn replace(&self, items: Vec<CatalogItem>) {
        let mut map = self.items.write();
        map.clear();
        for item in items {
            map.insert(item.id.clone(), item);
        }
    }

    /// Insert or update a single item
    pub fn upsert(&self, item: CatalogItem) {
        self.items.write().insert(item.id.clone(), item);
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl CatalogStore for InMemoryCatalog {
    fn get_item(&self, id: &str) -> Option<CatalogItem> {
        self.items.read().get(id).cloned()
    }
}
