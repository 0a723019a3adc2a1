//! Shared application state

use crate::catalog::{CatalogStore, InMemoryCatalog};
use crate::core::config::Config;
use crate::orders::engine::RevisionEngine;
use crate::storage::OrderStore;
use std::sync::Arc;

/// State handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RevisionEngine>,
    pub catalog: Arc<InMemoryCatalog>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Open storage, load the catalog and wire up the engine
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let store = OrderStore::open(config.db_path())?;

        let catalog = match &config.catalog_path {
            Some(path) => {
                let catalog = InMemoryCatalog::load_from_file(path)?;
                Arc::new(catalog)
            }
            None => {
                tracing::warn!("No CATALOG_PATH set, starting with an empty catalog");
                Arc::new(InMemoryCatalog::new())
            }
        };

        let engine = RevisionEngine::new(
            store,
            Arc::clone(&catalog) as Arc<dyn CatalogStore>,
        );

        Ok(Self {
            engine: Arc::new(engine),
            catalog,
            config: Arc::new(config.clone()),
        })
    }
}
