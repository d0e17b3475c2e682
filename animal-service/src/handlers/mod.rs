//! HTTP handlers for the animal collection
//!
//! - [`animals`]: list, get, create, update, delete
//! - [`ApiError`]: the `{code, msg}` error envelope
//! - [`InsertedId`] / [`DeletedCount`]: success envelopes

pub mod animals;
mod error;
mod response;

pub use error::{
    ApiError, ApiErrorKind, ApiOperation, ErrorBody, ANIMAL_EXISTS, ANIMAL_NOT_FOUND,
    NO_FIELDS_TO_UPDATE,
};
pub use response::{DeletedCount, InsertedId};
