//! Repository error types
//!
//! Structured errors for store operations. Backends translate their driver
//! errors into a [`RepositoryError`] carrying the operation, a coarse
//! [`RepositoryErrorKind`], and the driver's message.
//!
//! # Example
//!
//! ```rust
//! use animal_service::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::already_exists("Animal", "ana/rex");
//! assert!(matches!(error.kind, RepositoryErrorKind::AlreadyExists));
//! assert!(error.entity_id.is_some());
//! ```

use std::fmt;

/// Store operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Establishing the store connection
    Connect,
    /// Liveness check
    Ping,
    /// Creating an index
    CreateIndex,
    /// Finding every record matching a filter
    FindAll,
    /// Finding a single record matching a filter
    FindOne,
    /// Inserting a record
    InsertOne,
    /// Applying a partial update to a record
    UpdateOne,
    /// Deleting a record
    DeleteOne,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Ping => write!(f, "ping"),
            Self::CreateIndex => write!(f, "create_index"),
            Self::FindAll => write!(f, "find_all"),
            Self::FindOne => write!(f, "find_one"),
            Self::InsertOne => write!(f, "insert_one"),
            Self::UpdateOne => write!(f, "update_one"),
            Self::DeleteOne => write!(f, "delete_one"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// A record with the same unique key already exists
    AlreadyExists,
    /// The store could not be reached
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// The store rejected or failed the operation
    DatabaseError,
    /// A document could not be encoded or decoded
    SerializationError,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::SerializationError => write!(f, "serialization_error"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message, usually the driver's own text
    pub message: String,
    /// The type of entity involved
    pub entity_type: Option<String>,
    /// The id (or unique key) of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create an "already exists" error with entity context
    ///
    /// Raised by unique key violations on insert or update.
    pub fn already_exists(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::InsertOne,
            kind: RepositoryErrorKind::AlreadyExists,
            message: "Entity already exists".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: Some(identifier.into()),
        }
    }

    /// Create a database error
    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    /// Create a serialization error
    pub fn serialization_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::SerializationError, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is transient
    ///
    /// Nothing in the service retries; this is reported in the error logs.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(ref entity_type), Some(ref entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

impl From<bson::de::Error> for RepositoryError {
    fn from(err: bson::de::Error) -> Self {
        Self::serialization_error(RepositoryOperation::FindAll, err.to_string())
    }
}

impl From<bson::ser::Error> for RepositoryError {
    fn from(err: bson::ser::Error) -> Self {
        Self::serialization_error(RepositoryOperation::InsertOne, err.to_string())
    }
}
