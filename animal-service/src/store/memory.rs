//! In-memory store backend
//!
//! Used by the test suite and when no `[mongodb]` section is configured.
//! Behaves like the MongoDB backend with its unique `(owner, name)` index:
//! ids are ObjectIds generated locally, timestamps are truncated to
//! millisecond precision, and a duplicate `(owner, name)` is rejected under
//! the write lock.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{to_store_precision, Animal, AnimalId, AnimalPatch, NewAnimal};
use crate::repository::{
    AnimalFilter, AnimalStore, RepositoryError, RepositoryOperation, RepositoryResult,
    UpdateOutcome,
};

/// Animal store held in process memory
#[derive(Debug, Default)]
pub struct MemoryAnimalStore {
    // ObjectIds sort by creation time, so key order is insertion order
    records: RwLock<BTreeMap<AnimalId, Animal>>,
}

impl MemoryAnimalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn duplicate_key(
    records: &BTreeMap<AnimalId, Animal>,
    owner: &str,
    name: &str,
    except: Option<&AnimalId>,
) -> bool {
    records
        .values()
        .any(|a| Some(&a.id) != except && a.owner == owner && a.name == name)
}

#[async_trait]
impl AnimalStore for MemoryAnimalStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_all(&self, filter: &AnimalFilter) -> RepositoryResult<Vec<Animal>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn find_one(&self, filter: &AnimalFilter) -> RepositoryResult<Option<Animal>> {
        let records = self.records.read().await;
        let found = match filter {
            AnimalFilter::Id(id) => records.get(id).cloned(),
            _ => records.values().find(|a| filter.matches(a)).cloned(),
        };
        Ok(found)
    }

    async fn insert_one(&self, animal: NewAnimal) -> RepositoryResult<AnimalId> {
        let mut records = self.records.write().await;

        if duplicate_key(&records, &animal.owner, &animal.name, None) {
            return Err(RepositoryError::already_exists(
                "Animal",
                format!("{}/{}", animal.owner, animal.name),
            ));
        }

        let id = AnimalId::new();
        let mut record = Animal::from_new(id, animal);
        record.surgery = to_store_precision(record.surgery);
        records.insert(id, record);

        tracing::debug!(animal_id = %id, "inserted animal into memory store");
        Ok(id)
    }

    async fn update_one(
        &self,
        id: &AnimalId,
        patch: &AnimalPatch,
    ) -> RepositoryResult<UpdateOutcome> {
        let mut records = self.records.write().await;

        let Some(current) = records.get(id) else {
            return Ok(UpdateOutcome::default());
        };

        let mut updated = current.clone();
        updated.apply(patch);
        updated.surgery = to_store_precision(updated.surgery);

        if duplicate_key(&records, &updated.owner, &updated.name, Some(id)) {
            return Err(RepositoryError::already_exists(
                "Animal",
                format!("{}/{}", updated.owner, updated.name),
            )
            .with_operation(RepositoryOperation::UpdateOne));
        }

        let modified = u64::from(*current != updated);
        records.insert(*id, updated);

        Ok(UpdateOutcome {
            matched: 1,
            modified,
        })
    }

    async fn delete_one(&self, id: &AnimalId) -> RepositoryResult<u64> {
        let mut records = self.records.write().await;
        Ok(u64::from(records.remove(id).is_some()))
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
