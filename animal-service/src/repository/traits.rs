//! Store trait definitions
//!
//! [`AnimalStore`] is the persistence seam of the service: a thin
//! pass-through over the five collection operations plus a liveness check.
//! Handlers hold it as `Arc<dyn AnimalStore>`, so the trait uses
//! `async_trait` to stay object safe.
//!
//! # Example
//!
//! ```rust,ignore
//! use animal_service::repository::{AnimalFilter, AnimalStore};
//!
//! let store: Arc<dyn AnimalStore> = Arc::new(MemoryAnimalStore::new());
//! let id = store.insert_one(new_animal).await?;
//! let found = store.find_one(&AnimalFilter::Id(id)).await?;
//! ```

use async_trait::async_trait;

use super::error::RepositoryError;
use super::filter::AnimalFilter;
use crate::models::{Animal, AnimalId, AnimalPatch, NewAnimal};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Outcome of an `update_one` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// Number of records the filter matched (0 or 1)
    pub matched: u64,
    /// Number of records actually changed (0 or 1)
    pub modified: u64,
}

/// Persistence operations over the animal collection
///
/// No retries, transactions or batching. Implementations must be safe to
/// share across concurrent requests; conflicting writes are serialised by the
/// store itself.
#[async_trait]
pub trait AnimalStore: Send + Sync {
    /// Short backend name for logs and readiness output
    fn backend(&self) -> &'static str;

    /// All records matching `filter`, in storage iteration order
    ///
    /// A record that fails to decode aborts the whole call.
    async fn find_all(&self, filter: &AnimalFilter) -> RepositoryResult<Vec<Animal>>;

    /// The first record matching `filter`, if any
    async fn find_one(&self, filter: &AnimalFilter) -> RepositoryResult<Option<Animal>>;

    /// Insert a new record and return the id the store assigned
    async fn insert_one(&self, animal: NewAnimal) -> RepositoryResult<AnimalId>;

    /// Merge `patch` into the record with the given id
    ///
    /// A missing record is not an error: the outcome reports `matched == 0`.
    async fn update_one(&self, id: &AnimalId, patch: &AnimalPatch)
        -> RepositoryResult<UpdateOutcome>;

    /// Delete the record with the given id, returning the deleted count
    async fn delete_one(&self, id: &AnimalId) -> RepositoryResult<u64>;

    /// Check that the store is reachable
    async fn ping(&self) -> RepositoryResult<()>;

    /// Whether any record matches `filter`
    async fn exists(&self, filter: &AnimalFilter) -> RepositoryResult<bool> {
        Ok(self.find_one(filter).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // Minimal implementation to check the trait stays object safe and the
    // provided `exists` method routes through `find_one`.
    struct FixedStore(Option<Animal>);

    #[async_trait]
    impl AnimalStore for FixedStore {
        fn backend(&self) -> &'static str {
            "fixed"
        }

        async fn find_all(&self, _filter: &AnimalFilter) -> RepositoryResult<Vec<Animal>> {
            Ok(self.0.clone().into_iter().collect())
        }

        async fn find_one(&self, filter: &AnimalFilter) -> RepositoryResult<Option<Animal>> {
            Ok(self.0.clone().filter(|a| filter.matches(a)))
        }

        async fn insert_one(&self, _animal: NewAnimal) -> RepositoryResult<AnimalId> {
            Ok(AnimalId::new())
        }

        async fn update_one(
            &self,
            _id: &AnimalId,
            _patch: &AnimalPatch,
        ) -> RepositoryResult<UpdateOutcome> {
            Ok(UpdateOutcome::default())
        }

        async fn delete_one(&self, _id: &AnimalId) -> RepositoryResult<u64> {
            Ok(0)
        }

        async fn ping(&self) -> RepositoryResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_exists_uses_find_one() {
        let animal = Animal::from_new(AnimalId::new(), NewAnimal::default());
        let store: Arc<dyn AnimalStore> = Arc::new(FixedStore(Some(animal.clone())));

        assert!(store.exists(&AnimalFilter::Id(animal.id)).await.unwrap());
        assert!(!store.exists(&AnimalFilter::Id(AnimalId::new())).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store: Arc<dyn AnimalStore> = Arc::new(FixedStore(None));
        assert!(store.find_all(&AnimalFilter::All).await.unwrap().is_empty());
        assert_eq!(store.backend(), "fixed");
    }
}
