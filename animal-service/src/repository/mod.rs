//! Persistence abstractions for the animal collection
//!
//! - [`AnimalStore`]: the store trait (find-all, find-one, insert-one,
//!   update-one, delete-one, ping)
//! - [`AnimalFilter`]: the filters a handler can issue
//! - [`RepositoryError`]: structured store errors
//!
//! Concrete backends live in [`crate::store`].

mod error;
mod filter;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use filter::AnimalFilter;
pub use traits::{AnimalStore, RepositoryResult, UpdateOutcome};
