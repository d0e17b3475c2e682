//! Application state management

use std::sync::Arc;

use crate::{config::Config, repository::AnimalStore};

/// Application state shared across handlers
///
/// Cloned per request; both fields are reference counted.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn AnimalStore>,
}

impl AppState {
    /// Create a new AppState from a loaded configuration and a connected store
    pub fn new(config: Config, store: Arc<dyn AnimalStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the animal store
    pub fn store(&self) -> &dyn AnimalStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.config.service.name)
            .field("store", &self.store.backend())
            .finish()
    }
}
