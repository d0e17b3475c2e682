//! Animal domain model
//!
//! Three shapes travel through the service:
//!
//! - [`Animal`]: a stored record, always carrying its [`AnimalId`]
//! - [`NewAnimal`]: a create request body (no id, the store assigns one)
//! - [`AnimalPatch`]: a partial update, restricted to the known Animal fields
//!
//! # Example
//!
//! ```rust
//! use animal_service::models::{AnimalId, AnimalPatch};
//!
//! let id: AnimalId = "65a1f0c2e4b0a1b2c3d4e5f6".parse().unwrap();
//! assert_eq!(id.to_string(), "65a1f0c2e4b0a1b2c3d4e5f6");
//! assert!("not-an-id".parse::<AnimalId>().is_err());
//!
//! let patch: AnimalPatch = serde_json::from_str(r#"{"age": 5}"#).unwrap();
//! assert_eq!(patch.age, Some(5));
//! assert!(patch.name.is_none());
//! ```

use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a stored animal
///
/// Wraps the document store's native ObjectId. Serialized as its 24 character
/// hex form in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimalId(ObjectId);

impl AnimalId {
    /// Generate a fresh identifier
    #[must_use]
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// The underlying ObjectId
    #[must_use]
    pub const fn as_object_id(&self) -> &ObjectId {
        &self.0
    }

    /// Hex representation, as used in URLs and JSON
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Default for AnimalId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for AnimalId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl From<AnimalId> for ObjectId {
    fn from(id: AnimalId) -> Self {
        id.0
    }
}

impl fmt::Display for AnimalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for AnimalId {
    type Err = bson::oid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s).map(Self)
    }
}

impl Serialize for AnimalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for AnimalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A stored animal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    #[serde(rename = "_id")]
    pub id: AnimalId,
    pub name: String,
    pub owner: String,
    /// Species or category
    #[serde(rename = "type")]
    pub kind: String,
    pub age: i64,
    pub castrated: bool,
    pub surgery: DateTime<Utc>,
}

impl Animal {
    /// Build a record from a create request and the id the store assigned
    #[must_use]
    pub fn from_new(id: AnimalId, new: NewAnimal) -> Self {
        Self {
            id,
            name: new.name,
            owner: new.owner,
            kind: new.kind,
            age: new.age,
            castrated: new.castrated,
            surgery: new.surgery,
        }
    }

    /// Merge the supplied patch fields into this record
    pub fn apply(&mut self, patch: &AnimalPatch) {
        if let Some(ref name) = patch.name {
            self.name.clone_from(name);
        }
        if let Some(ref owner) = patch.owner {
            self.owner.clone_from(owner);
        }
        if let Some(ref kind) = patch.kind {
            self.kind.clone_from(kind);
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(castrated) = patch.castrated {
            self.castrated = castrated;
        }
        if let Some(surgery) = patch.surgery {
            self.surgery = surgery;
        }
    }
}

/// Create request body
///
/// Every field is optional on the wire; missing fields take their zero value
/// (empty string, `0`, `false`, Unix epoch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnimal {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub age: i64,
    #[serde(default)]
    pub castrated: bool,
    #[serde(default = "epoch")]
    pub surgery: DateTime<Utc>,
}

impl Default for NewAnimal {
    fn default() -> Self {
        Self {
            name: String::new(),
            owner: String::new(),
            kind: String::new(),
            age: 0,
            castrated: false,
            surgery: epoch(),
        }
    }
}

/// Partial update body
///
/// Only the Animal fields are accepted; any other key (including `_id`) is a
/// deserialization error. Absent or `null` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimalPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub castrated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgery: Option<DateTime<Utc>>,
}

impl AnimalPatch {
    /// True when no field would be changed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.owner.is_none()
            && self.kind.is_none()
            && self.age.is_none()
            && self.castrated.is_none()
            && self.surgery.is_none()
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Truncate a timestamp to the millisecond precision of a BSON datetime
#[must_use]
pub fn to_store_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}
