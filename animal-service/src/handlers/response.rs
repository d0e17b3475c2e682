//! Success envelopes for the animal endpoints

use serde::{Deserialize, Serialize};

use crate::models::AnimalId;

/// Body returned by create and update
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsertedId {
    #[serde(rename = "_id")]
    pub id: AnimalId,
}

impl InsertedId {
    pub fn new(id: AnimalId) -> Self {
        Self { id }
    }
}

/// Body returned by delete
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletedCount {
    pub deleted_count: u64,
}
