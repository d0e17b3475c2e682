//! Animal collection handlers
//!
//! Ids arrive as 24 character hex strings in the path and are parsed here, so
//! a malformed id is always a 400 and never reaches the store. Bodies are
//! taken as `Result<Json<_>, JsonRejection>` to report decode failures in the
//! `{code, msg}` envelope, and, for update, only after the id is known to
//! exist.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::error::{ApiError, ApiOperation, NO_FIELDS_TO_UPDATE};
use super::response::{DeletedCount, InsertedId};
use crate::models::{Animal, AnimalId, AnimalPatch, NewAnimal};
use crate::repository::AnimalFilter;
use crate::state::AppState;

fn parse_id(
    operation: ApiOperation,
    path: Result<Path<String>, PathRejection>,
) -> Result<AnimalId, ApiError> {
    let Path(raw) = path.map_err(|r| ApiError::from_path_rejection(operation, r))?;
    raw.parse().map_err(|e| {
        ApiError::bad_request(operation, format!("invalid animal id {raw:?}: {e}"))
    })
}

/// `GET /api/v1/`: every stored animal, in store order
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Animal>>, ApiError> {
    let animals = state
        .store()
        .find_all(&AnimalFilter::All)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::List))?;

    tracing::debug!(count = animals.len(), "listed animals");
    Ok(Json(animals))
}

/// `GET /api/v1/{id}`: one animal, or 404 with an empty body
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(ApiOperation::Get, id)?;

    let found = state
        .store()
        .find_one(&AnimalFilter::Id(id))
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Get))?;

    match found {
        Some(animal) => Ok(Json(animal).into_response()),
        None => {
            tracing::debug!(animal_id = %id, "animal not found");
            Ok(StatusCode::NOT_FOUND.into_response())
        }
    }
}

/// `POST /api/v1/`: store a new animal and return its id
///
/// The `(owner, name)` lookup gives the friendly error; the store's own
/// uniqueness check catches concurrent creates that slip past it.
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<NewAnimal>, JsonRejection>,
) -> Result<Json<InsertedId>, ApiError> {
    let op = ApiOperation::Create;
    let Json(animal) = body.map_err(|r| ApiError::from_json_rejection(op, r))?;

    let duplicate = state
        .store()
        .exists(&AnimalFilter::owner_and_name(&animal.owner, &animal.name))
        .await
        .map_err(|e| ApiError::from(e).with_operation(op))?;
    if duplicate {
        return Err(ApiError::already_exists(op));
    }

    let id = state
        .store()
        .insert_one(animal)
        .await
        .map_err(|e| ApiError::from(e).with_operation(op))?;

    tracing::info!(animal_id = %id, "animal created");
    Ok(Json(InsertedId::new(id)))
}

/// `PUT /api/v1/{id}`: merge the supplied fields into an existing animal
pub async fn update(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<AnimalPatch>, JsonRejection>,
) -> Result<Json<InsertedId>, ApiError> {
    let op = ApiOperation::Update;
    let id = parse_id(op, id)?;

    let exists = state
        .store()
        .exists(&AnimalFilter::Id(id))
        .await
        .map_err(|e| ApiError::from(e).with_operation(op))?;
    if !exists {
        return Err(ApiError::animal_not_found(id.to_hex()));
    }

    let Json(patch) = body.map_err(|r| ApiError::from_json_rejection(op, r))?;
    if patch.is_empty() {
        return Err(ApiError::bad_request(op, NO_FIELDS_TO_UPDATE).with_entity(id.to_hex()));
    }

    let outcome = state
        .store()
        .update_one(&id, &patch)
        .await
        .map_err(|e| ApiError::from(e).with_operation(op))?;

    // Deleted between the existence check and the update
    if outcome.matched == 0 {
        return Err(ApiError::animal_not_found(id.to_hex()));
    }

    tracing::info!(
        animal_id = %id,
        modified = outcome.modified,
        "animal updated"
    );
    Ok(Json(InsertedId::new(id)))
}

/// `DELETE /api/v1/{id}`: remove an animal, reporting how many were removed
pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<DeletedCount>, ApiError> {
    let op = ApiOperation::Delete;
    let id = parse_id(op, id)?;

    let deleted_count = state
        .store()
        .delete_one(&id)
        .await
        .map_err(|e| ApiError::from(e).with_operation(op))?;

    tracing::info!(animal_id = %id, deleted_count, "animal delete processed");
    Ok(Json(DeletedCount { deleted_count }))
}
