//! Store backends
//!
//! [`connect`] picks the backend from configuration: MongoDB when a
//! `[mongodb]` section is present, otherwise the in-memory store.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::repository::AnimalStore;

mod memory;
mod mongo;

pub use memory::MemoryAnimalStore;
pub use mongo::MongoAnimalStore;

/// Build the store selected by `config`
///
/// For MongoDB this connects, pings, and ensures the unique `(owner, name)`
/// index when enabled. Any failure is returned to the caller, which is
/// expected to abort startup.
pub async fn connect(config: &Config) -> Result<Arc<dyn AnimalStore>> {
    let Some(ref mongo) = config.mongodb else {
        tracing::warn!("No [mongodb] section configured, using the in-memory store");
        return Ok(Arc::new(MemoryAnimalStore::new()));
    };

    let store = MongoAnimalStore::connect(mongo).await?;
    if mongo.unique_owner_name {
        store.ensure_unique_owner_name().await?;
    }

    Ok(Arc::new(store))
}
