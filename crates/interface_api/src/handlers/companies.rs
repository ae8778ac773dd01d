//! Company handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use core_kernel::CompanyId;
use domain_crm::{Company, CompanyInput};

use super::{create_record, delete_record, list_or_search, update_record};
use crate::dto::{DeleteResponse, RecordBody, SearchParams};
use crate::{error::ApiError, AppState};

/// Lists companies, or searches them with `?q=`
pub async fn list_companies(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Company>> {
    Json(list_or_search(&state.crm.companies, params.q).await)
}

/// Creates a company
pub async fn create_company(
    State(state): State<AppState>,
    Json(body): Json<RecordBody>,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    create_record::<_, CompanyInput>(&state.crm.companies, body).await
}

/// Gets a company by ID
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
) -> Result<Json<Company>, ApiError> {
    Ok(Json(state.crm.companies.get_by_id(id).await?))
}

/// Updates the supplied fields of a company
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
    Json(body): Json<RecordBody>,
) -> Result<Json<Company>, ApiError> {
    update_record::<_, CompanyInput>(&state.crm.companies, id, body).await
}

/// Deletes a company
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<CompanyId>,
) -> Result<Json<DeleteResponse>, ApiError> {
    delete_record(&state.crm.companies, id).await
}
