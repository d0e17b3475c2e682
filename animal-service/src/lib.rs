//! # animal-service
//!
//! HTTP CRUD API over a MongoDB collection of animal records.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/`: list every animal
//! - `GET /api/v1/{id}`: fetch one animal (404 with an empty body when absent)
//! - `POST /api/v1/`: create an animal, returns `{"_id": ...}`
//! - `PUT /api/v1/{id}`: merge fields into an animal, returns `{"_id": ...}`
//! - `DELETE /api/v1/{id}`: delete an animal, returns `{"deleted_count": n}`
//! - `GET /health`, `GET /ready`: liveness and readiness checks
//!
//! Errors are returned as `{"code": <status>, "msg": <text>}`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use animal_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store = store::connect(&config).await?;
//!     let app = router(AppState::new(config.clone(), store));
//!
//!     Server::new(config).serve(app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repository;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, MiddlewareConfig, MongoConfig, ServiceConfig};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ApiErrorKind, ApiOperation};
    pub use crate::health::{health, readiness};
    pub use crate::models::{Animal, AnimalId, AnimalPatch, NewAnimal};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{AnimalFilter, AnimalStore, RepositoryError, RepositoryResult};
    pub use crate::routes::{router, API_PREFIX};
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::store::{self, MemoryAnimalStore, MongoAnimalStore};

    // Re-export tokio for async runtime
    pub use tokio;
}
