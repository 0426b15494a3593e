//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use storefront_core::ports::{AssetStore, DatabaseService};
use storefront_core::{CartManager, CatalogService, CategoryHierarchy};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub assets: Arc<dyn AssetStore>,
    pub config: Arc<Config>,
    pub catalog: CatalogService,
    pub categories: CategoryHierarchy,
    pub carts: CartManager,
}

impl AppState {
    /// Wires the managers onto the given adapters.
    pub fn new(
        db: Arc<dyn DatabaseService>,
        assets: Arc<dyn AssetStore>,
        config: Arc<Config>,
    ) -> Self {
        let max_upload = config.max_file_upload;
        Self {
            catalog: CatalogService::new(db.clone(), assets.clone(), max_upload),
            categories: CategoryHierarchy::new(db.clone(), assets.clone(), max_upload),
            carts: CartManager::new(db.clone()),
            db,
            assets,
            config,
        }
    }
}
