//! Request handlers, one module per entity
//!
//! Create and update bodies are checked against the entity's typed input
//! (and its `validator` rules) and then forwarded as the raw JSON object.

pub mod health;
pub mod contacts;
pub mod companies;
pub mod deals;
pub mod activities;

use axum::{http::StatusCode, Json};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use core_kernel::RecordKey;
use domain_crm::schema::logical_keys;
use domain_crm::{EntityRepository, EntitySchema};

use crate::dto::{DeleteResponse, RecordBody};
use crate::error::ApiError;

/// Rejects bodies that do not parse as `I` or break its validation rules
///
/// Store-named keys are checked under their logical names, since the
/// record layer accepts either.
pub(crate) fn validate_body<S, I>(body: &RecordBody) -> Result<(), ApiError>
where
    S: EntitySchema,
    I: DeserializeOwned + Validate,
{
    let input: I = serde_json::from_value(Value::Object(logical_keys::<S>(body)))
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?;
    input.validate()?;
    Ok(())
}

pub(crate) async fn list_or_search<S: EntitySchema>(repo: &EntityRepository<S>, q: Option<String>) -> Vec<S> {
    match q {
        Some(term) => repo.search(&term).await,
        None => repo.list().await,
    }
}

pub(crate) async fn create_record<S, I>(
    repo: &EntityRepository<S>,
    body: RecordBody,
) -> Result<(StatusCode, Json<S>), ApiError>
where
    S: EntitySchema,
    I: DeserializeOwned + Validate,
{
    validate_body::<S, I>(&body)?;
    let record = repo.create(&body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn update_record<S, I>(
    repo: &EntityRepository<S>,
    id: S::Id,
    body: RecordBody,
) -> Result<Json<S>, ApiError>
where
    S: EntitySchema,
    I: DeserializeOwned + Validate,
{
    validate_body::<S, I>(&body)?;
    Ok(Json(repo.update(id, &body).await?))
}

pub(crate) async fn delete_record<S: EntitySchema>(
    repo: &EntityRepository<S>,
    id: S::Id,
) -> Result<Json<DeleteResponse>, ApiError> {
    let raw = id.raw();
    let deleted = repo.delete(id).await?;
    Ok(Json(DeleteResponse { id: raw, deleted }))
}
