//! Contact handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use core_kernel::{ContactId, RecordKey};
use domain_crm::{BulkDeleteOutcome, BulkUpdateOutcome, Contact, ContactInput};

use super::{create_record, delete_record, list_or_search, update_record, validate_body};
use crate::dto::{BulkDeleteRequest, BulkUpdateRequest, DeleteResponse, RecordBody, SearchParams};
use crate::{error::ApiError, AppState};

/// Lists contacts, or searches them with `?q=`
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Contact>> {
    Json(list_or_search(&state.crm.contacts, params.q).await)
}

/// Creates a contact
pub async fn create_contact(
    State(state): State<AppState>,
    Json(body): Json<RecordBody>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    create_record::<_, ContactInput>(&state.crm.contacts, body).await
}

/// Gets a contact by ID
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
) -> Result<Json<Contact>, ApiError> {
    Ok(Json(state.crm.contacts.get_by_id(id).await?))
}

/// Updates the supplied fields of a contact
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
    Json(body): Json<RecordBody>,
) -> Result<Json<Contact>, ApiError> {
    update_record::<_, ContactInput>(&state.crm.contacts, id, body).await
}

/// Deletes a contact
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
) -> Result<Json<DeleteResponse>, ApiError> {
    delete_record(&state.crm.contacts, id).await
}

/// Applies one patch to many contacts; partial failure is reported, not raised
pub async fn bulk_update_contacts(
    State(state): State<AppState>,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<Json<BulkUpdateOutcome<Contact>>, ApiError> {
    validate_body::<Contact, ContactInput>(&request.patch)?;
    let ids: Vec<ContactId> = request.ids.into_iter().map(ContactId::from_raw).collect();
    Ok(Json(state.crm.contacts.bulk_update(&ids, &request.patch).await))
}

/// Deletes many contacts; partial failure is reported, not raised
pub async fn bulk_delete_contacts(
    State(state): State<AppState>,
    Json(request): Json<BulkDeleteRequest>,
) -> Json<BulkDeleteOutcome<ContactId>> {
    let ids: Vec<ContactId> = request.ids.into_iter().map(ContactId::from_raw).collect();
    Json(state.crm.contacts.bulk_delete(&ids).await)
}

/// Exports contacts (all, or the `?q=` matches) as CSV
pub async fn export_contacts(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let contacts = list_or_search(&state.crm.contacts, params.q).await;
    let export = state.crm.contacts.export_csv(&contacts)?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    )
        .into_response())
}
