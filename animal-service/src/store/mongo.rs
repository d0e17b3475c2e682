//! MongoDB store backend
//!
//! One client per process, connected and pinged at startup. The collection is
//! handled as raw BSON documents and decoded record by record, so a single
//! malformed document fails the whole listing instead of being skipped.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions},
    Client, Collection, IndexModel,
};
use serde::{Deserialize, Serialize};

use crate::config::MongoConfig;
use crate::error::sanitize_url;
use crate::models::{Animal, AnimalId, AnimalPatch, NewAnimal};
use crate::repository::{
    AnimalFilter, AnimalStore, RepositoryError, RepositoryErrorKind, RepositoryOperation,
    RepositoryResult, UpdateOutcome,
};

const DUPLICATE_KEY_CODE: i32 = 11000;
const OWNER_NAME_INDEX: &str = "owner_1_name_1";

/// Animal store backed by a MongoDB collection
#[derive(Debug, Clone)]
pub struct MongoAnimalStore {
    client: Client,
    database: String,
    collection: Collection<Document>,
}

/// On-disk document layout
#[derive(Debug, Serialize, Deserialize)]
struct AnimalDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    owner: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    age: i64,
    #[serde(default)]
    castrated: bool,
    #[serde(
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime",
        default = "epoch"
    )]
    surgery: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl From<NewAnimal> for AnimalDocument {
    fn from(new: NewAnimal) -> Self {
        Self {
            id: None,
            name: new.name,
            owner: new.owner,
            kind: new.kind,
            age: new.age,
            castrated: new.castrated,
            surgery: new.surgery,
        }
    }
}

impl AnimalDocument {
    fn into_animal(self) -> RepositoryResult<Animal> {
        let id = self.id.ok_or_else(|| {
            RepositoryError::serialization_error(
                RepositoryOperation::FindAll,
                "document is missing its _id",
            )
        })?;
        Ok(Animal {
            id: id.into(),
            name: self.name,
            owner: self.owner,
            kind: self.kind,
            age: self.age,
            castrated: self.castrated,
            surgery: self.surgery,
        })
    }
}

fn decode(operation: RepositoryOperation, document: Document) -> RepositoryResult<Animal> {
    let raw: AnimalDocument = bson::from_document(document)
        .map_err(|e| RepositoryError::from(e).with_operation(operation))?;
    raw.into_animal().map_err(|e| e.with_operation(operation))
}

/// Translate a filter into a query document
fn filter_document(filter: &AnimalFilter) -> Document {
    match filter {
        AnimalFilter::All => Document::new(),
        AnimalFilter::Id(id) => doc! { "_id": *id.as_object_id() },
        AnimalFilter::OwnerAndName { owner, name } => doc! { "owner": owner, "name": name },
    }
}

/// Build the `$set` document for a patch, field by field
fn set_document(patch: &AnimalPatch) -> Document {
    let mut set = Document::new();
    if let Some(ref name) = patch.name {
        set.insert("name", name.as_str());
    }
    if let Some(ref owner) = patch.owner {
        set.insert("owner", owner.as_str());
    }
    if let Some(ref kind) = patch.kind {
        set.insert("type", kind.as_str());
    }
    if let Some(age) = patch.age {
        set.insert("age", age);
    }
    if let Some(castrated) = patch.castrated {
        set.insert("castrated", castrated);
    }
    if let Some(surgery) = patch.surgery {
        set.insert("surgery", bson::DateTime::from_chrono(surgery));
    }
    set
}

fn io_error_kind(kind: std::io::ErrorKind) -> RepositoryErrorKind {
    match kind {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            RepositoryErrorKind::Timeout
        }
        _ => RepositoryErrorKind::ConnectionFailed,
    }
}

/// Map a driver error onto the repository error model
fn map_error(operation: RepositoryOperation, err: mongodb::error::Error) -> RepositoryError {
    let message = err.to_string();
    let kind = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE => {
            RepositoryErrorKind::AlreadyExists
        }
        ErrorKind::Command(command) if command.code == DUPLICATE_KEY_CODE => {
            RepositoryErrorKind::AlreadyExists
        }
        // Selection only fails once `server_selection_timeout` has elapsed
        ErrorKind::ServerSelection { .. } => RepositoryErrorKind::Timeout,
        ErrorKind::Io(io) => io_error_kind(io.kind()),
        ErrorKind::BsonDeserialization(_) | ErrorKind::BsonSerialization(_) => {
            RepositoryErrorKind::SerializationError
        }
        _ => RepositoryErrorKind::DatabaseError,
    };

    if kind == RepositoryErrorKind::AlreadyExists {
        return RepositoryError::already_exists("Animal", "owner/name").with_operation(operation);
    }
    RepositoryError::new(operation, kind, message)
}

impl MongoAnimalStore {
    /// Connect to the configured server, ping it, and bind the collection
    ///
    /// Any failure here is fatal for the caller; there is no retry.
    pub async fn connect(config: &MongoConfig) -> RepositoryResult<Self> {
        let url = config.connection_url();
        let url_safe = sanitize_url(&url);
        tracing::debug!("Connecting to MongoDB: {}", url_safe);

        let mut options = ClientOptions::parse(&url)
            .await
            .map_err(|e| map_error(RepositoryOperation::Connect, e))?;
        options.app_name = config.app_name.clone();
        options.connect_timeout = Some(config.connect_timeout());
        options.server_selection_timeout = Some(config.connect_timeout());

        let client = Client::with_options(options)
            .map_err(|e| map_error(RepositoryOperation::Connect, e))?;
        let store = Self::from_client(client, &config.database, &config.collection);

        store.ping().await?;

        tracing::info!(
            "MongoDB connected: url={}, database={}, collection={}",
            url_safe,
            config.database,
            config.collection
        );

        Ok(store)
    }

    /// Bind an already constructed client to a database and collection
    pub fn from_client(client: Client, database: &str, collection: &str) -> Self {
        let collection = client.database(database).collection::<Document>(collection);
        Self {
            client,
            database: database.to_string(),
            collection,
        }
    }

    /// Create the unique `(owner, name)` index if it does not exist yet
    ///
    /// Fails if existing data already violates the constraint.
    pub async fn ensure_unique_owner_name(&self) -> RepositoryResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "owner": 1, "name": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(OWNER_NAME_INDEX.to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(|e| map_error(RepositoryOperation::CreateIndex, e))?;

        tracing::info!(index = OWNER_NAME_INDEX, "unique (owner, name) index ensured");
        Ok(())
    }
}

#[async_trait]
impl AnimalStore for MongoAnimalStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn find_all(&self, filter: &AnimalFilter) -> RepositoryResult<Vec<Animal>> {
        let op = RepositoryOperation::FindAll;
        let mut cursor = self
            .collection
            .find(filter_document(filter))
            .await
            .map_err(|e| map_error(op, e))?;

        let mut animals = Vec::new();
        while let Some(document) = cursor.try_next().await.map_err(|e| map_error(op, e))? {
            animals.push(decode(op, document)?);
        }
        Ok(animals)
    }

    async fn find_one(&self, filter: &AnimalFilter) -> RepositoryResult<Option<Animal>> {
        let op = RepositoryOperation::FindOne;
        let document = self
            .collection
            .find_one(filter_document(filter))
            .await
            .map_err(|e| map_error(op, e))?;

        document.map(|d| decode(op, d)).transpose()
    }

    async fn insert_one(&self, animal: NewAnimal) -> RepositoryResult<AnimalId> {
        let op = RepositoryOperation::InsertOne;
        let document = bson::to_document(&AnimalDocument::from(animal))?;

        let result = self
            .collection
            .insert_one(document)
            .await
            .map_err(|e| map_error(op, e))?;

        match result.inserted_id {
            Bson::ObjectId(oid) => Ok(oid.into()),
            other => Err(RepositoryError::serialization_error(
                op,
                format!("store returned a non-ObjectId _id: {other}"),
            )),
        }
    }

    async fn update_one(
        &self,
        id: &AnimalId,
        patch: &AnimalPatch,
    ) -> RepositoryResult<UpdateOutcome> {
        let op = RepositoryOperation::UpdateOne;
        let update = doc! { "$set": set_document(patch) };

        let result = self
            .collection
            .update_one(filter_document(&AnimalFilter::Id(*id)), update)
            .await
            .map_err(|e| map_error(op, e).with_entity("Animal", id.to_hex()))?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, id: &AnimalId) -> RepositoryResult<u64> {
        let result = self
            .collection
            .delete_one(filter_document(&AnimalFilter::Id(*id)))
            .await
            .map_err(|e| map_error(RepositoryOperation::DeleteOne, e))?;

        Ok(result.deleted_count)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| map_error(RepositoryOperation::Ping, e))?;
        Ok(())
    }
}
