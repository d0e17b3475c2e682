//! Query filters understood by every store backend

use crate::models::{Animal, AnimalId};

/// Selects which animal records a query applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimalFilter {
    /// Every record (the empty filter)
    All,
    /// The record with the given id
    Id(AnimalId),
    /// Records with the given `(owner, name)` pair
    OwnerAndName { owner: String, name: String },
}

impl AnimalFilter {
    /// Filter on the `(owner, name)` pair
    pub fn owner_and_name(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::OwnerAndName {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Evaluate the filter against a record held in memory
    pub fn matches(&self, animal: &Animal) -> bool {
        match self {
            Self::All => true,
            Self::Id(id) => animal.id == *id,
            Self::OwnerAndName { owner, name } => animal.owner == *owner && animal.name == *name,
        }
    }
}
