//! Module declaration for the inventory module.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing::{debug, info};

use crate::api::rest;
use crate::config::InventoryConfig;
use crate::domain::error::DomainError;
use crate::domain::insight::{ChatCompletion, InsightService};
use crate::domain::repo::InventoryFile;
use crate::domain::store::InventoryStore;
use crate::infra::insight::HttpChatClient;
use crate::infra::storage::FlatFile;

/// Inventory module: the item store, its backing file and the REST API over it.
pub struct InventoryModule {
    store: Arc<InventoryStore>,
    insight: Arc<InsightService>,
}

impl InventoryModule {
    /// Name of the module's section under `modules.` in the app config.
    pub const NAME: &'static str = "inventory";

    /// Load the inventory file and set up the optional insight client.
    ///
    /// # Errors
    /// Returns an error if the capacity is zero, the data file exists but
    /// cannot be read, or the insight client cannot be created.
    pub fn init(config: &InventoryConfig) -> anyhow::Result<Self> {
        info!("Initializing inventory module");
        debug!(
            data_file = %config.data_file.display(),
            capacity = config.capacity,
            insight = config.insight.endpoint.is_some(),
            "Loaded inventory config"
        );
        anyhow::ensure!(config.capacity > 0, "inventory capacity must be at least 1");

        let client = HttpChatClient::from_config(&config.insight)?
            .map(|client| Arc::new(client) as Arc<dyn ChatCompletion>);
        let file = Arc::new(FlatFile::new(&config.data_file));

        let module = Self::with_file(file, config.capacity, client).with_context(|| {
            format!(
                "failed to load inventory from {}",
                config.data_file.display()
            )
        })?;

        info!("Inventory module initialized");
        Ok(module)
    }

    /// Assemble the module over an arbitrary backing file.
    ///
    /// # Errors
    /// Returns [`DomainError::Persistence`] if `file` cannot be read.
    pub fn with_file(
        file: Arc<dyn InventoryFile>,
        capacity: usize,
        client: Option<Arc<dyn ChatCompletion>>,
    ) -> Result<Self, DomainError> {
        let store = Arc::new(InventoryStore::load(file, capacity)?);
        let insight = Arc::new(InsightService::new(store.clone(), client));
        Ok(Self { store, insight })
    }

    #[must_use]
    pub fn store(&self) -> Arc<InventoryStore> {
        self.store.clone()
    }

    /// REST routes, ready to be merged into the application router.
    pub fn router(&self) -> Router {
        rest::router(self.store.clone(), self.insight.clone())
    }
}
