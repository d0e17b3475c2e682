//! Route table
//!
//! The collection is served under `/api/v1`, with and without the trailing
//! slash. Health checks live at the root.

use axum::{routing::get, Router};

use crate::handlers::animals;
use crate::health::{health, readiness};
use crate::state::AppState;

/// Path prefix of the animal collection
pub const API_PREFIX: &str = "/api/v1";

/// Build the application router
///
/// Middleware is added separately by [`crate::server::with_middleware`].
pub fn router(state: AppState) -> Router {
    let collection = get(animals::list).post(animals::create);
    let item = get(animals::get)
        .put(animals::update)
        .delete(animals::delete);

    Router::new()
        .route(API_PREFIX, collection.clone())
        .route(&format!("{API_PREFIX}/"), collection)
        .route(&format!("{API_PREFIX}/{{id}}"), item)
        .route("/health", get(health))
        .route("/ready", get(readiness))
        .with_state(state)
}
