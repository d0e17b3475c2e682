//! API error types for handler operations
//!
//! Every failure a handler reports is an [`ApiError`], rendered as
//! `{"code": <status>, "msg": <text>}`. Only a missing record is a 404;
//! everything else, store failures included, is a 400.
//!
//! # Example
//!
//! ```rust
//! use animal_service::handlers::{ApiError, ApiErrorKind};
//!
//! let error = ApiError::animal_not_found("65a1f0c2e4b0a1b2c3d4e5f6");
//! assert!(matches!(error.kind, ApiErrorKind::NotFound));
//! assert_eq!(error.status_code().as_u16(), 404);
//! ```

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};

/// Message returned when an `(owner, name)` pair is already taken
pub const ANIMAL_EXISTS: &str = "this animal already exists";

/// Message returned when updating an id that does not exist
pub const ANIMAL_NOT_FOUND: &str = "animal not found";

/// Message returned for an update body without any field
pub const NO_FIELDS_TO_UPDATE: &str = "no fields to update";

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Listing every animal
    List,
    /// Getting a single animal by id
    Get,
    /// Creating an animal
    Create,
    /// Updating an animal
    Update,
    /// Deleting an animal
    Delete,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Malformed id, body, or content type
    BadRequest,
    /// An animal with the same owner and name exists
    AlreadyExists,
    /// The addressed animal does not exist
    NotFound,
    /// The store failed the operation
    StoreFailure,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::NotFound => write!(f, "not_found"),
            Self::StoreFailure => write!(f, "store_failure"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest | Self::AlreadyExists | Self::StoreFailure => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

/// Structured API error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Message sent to the client as `msg`
    pub message: String,
    /// The id of the animal involved, when known
    pub entity_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_id: None,
        }
    }

    /// Create a bad request error
    pub fn bad_request(operation: ApiOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ApiErrorKind::BadRequest, message)
    }

    /// Create the duplicate `(owner, name)` error
    pub fn already_exists(operation: ApiOperation) -> Self {
        Self::new(operation, ApiErrorKind::AlreadyExists, ANIMAL_EXISTS)
    }

    /// Create the 404 returned by update for an unknown id
    pub fn animal_not_found(id: impl Into<String>) -> Self {
        Self::new(ApiOperation::Update, ApiErrorKind::NotFound, ANIMAL_NOT_FOUND).with_entity(id)
    }

    /// Create a bad request error from a rejected JSON body
    pub fn from_json_rejection(operation: ApiOperation, rejection: JsonRejection) -> Self {
        Self::bad_request(operation, rejection.body_text())
    }

    /// Create a bad request error from a path segment axum could not extract
    ///
    /// Raised for ids that are not valid UTF-8 after percent decoding.
    pub fn from_path_rejection(operation: ApiOperation, rejection: PathRejection) -> Self {
        Self::bad_request(operation, rejection.body_text())
    }

    /// Add the id of the animal involved
    #[must_use]
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref entity_id) = self.entity_id {
            write!(f, " [Animal: {}]", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Response body for API errors
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// HTTP status code, repeated in the body
    pub code: u16,
    /// Error text
    pub msg: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.kind == ApiErrorKind::StoreFailure {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                kind = %self.kind,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
        }

        let body = ErrorBody {
            code: status.as_u16(),
            msg: self.message,
        };

        (status, Json(body)).into_response()
    }
}

fn repository_operation_to_api_operation(op: RepositoryOperation) -> ApiOperation {
    match op {
        RepositoryOperation::FindAll => ApiOperation::List,
        RepositoryOperation::InsertOne => ApiOperation::Create,
        RepositoryOperation::UpdateOne => ApiOperation::Update,
        RepositoryOperation::DeleteOne => ApiOperation::Delete,
        RepositoryOperation::FindOne
        | RepositoryOperation::Connect
        | RepositoryOperation::Ping
        | RepositoryOperation::CreateIndex => ApiOperation::Get,
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let operation = repository_operation_to_api_operation(err.operation);

        tracing::debug!(
            store_operation = %err.operation,
            store_kind = %err.kind,
            retriable = err.is_retriable(),
            "store error: {}", err.message
        );

        // Store text is passed through to the client unchanged
        let (kind, message) = match err.kind {
            RepositoryErrorKind::AlreadyExists => {
                (ApiErrorKind::AlreadyExists, ANIMAL_EXISTS.to_string())
            }
            _ => (ApiErrorKind::StoreFailure, err.message),
        };

        Self {
            operation,
            kind,
            message,
            entity_id: err.entity_id,
        }
    }
}
