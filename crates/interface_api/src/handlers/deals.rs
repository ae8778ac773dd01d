//! Deal handlers

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use core_kernel::DealId;
use domain_crm::{deal_stages, Deal, DealInput, DealStage, StageSummary};

use super::{create_record, delete_record, list_or_search, update_record};
use crate::dto::{DeleteResponse, LabelsResponse, RecordBody, SearchParams, StageUpdateRequest};
use crate::{error::ApiError, AppState};

/// Lists deals, or searches them by title with `?q=`
pub async fn list_deals(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Deal>> {
    Json(list_or_search(&state.crm.deals, params.q).await)
}

/// Creates a deal
pub async fn create_deal(
    State(state): State<AppState>,
    Json(body): Json<RecordBody>,
) -> Result<(StatusCode, Json<Deal>), ApiError> {
    create_record::<_, DealInput>(&state.crm.deals, body).await
}

/// Gets a deal by ID
pub async fn get_deal(
    State(state): State<AppState>,
    Path(id): Path<DealId>,
) -> Result<Json<Deal>, ApiError> {
    Ok(Json(state.crm.deals.get_by_id(id).await?))
}

/// Updates the supplied fields of a deal
pub async fn update_deal(
    State(state): State<AppState>,
    Path(id): Path<DealId>,
    Json(body): Json<RecordBody>,
) -> Result<Json<Deal>, ApiError> {
    update_record::<_, DealInput>(&state.crm.deals, id, body).await
}

/// Deletes a deal
pub async fn delete_deal(
    State(state): State<AppState>,
    Path(id): Path<DealId>,
) -> Result<Json<DeleteResponse>, ApiError> {
    delete_record(&state.crm.deals, id).await
}

/// Moves a deal to another pipeline stage
pub async fn update_stage(
    State(state): State<AppState>,
    Path(id): Path<DealId>,
    Json(request): Json<StageUpdateRequest>,
) -> Result<Json<Deal>, ApiError> {
    Ok(Json(state.crm.deals.update_stage(id, &request.stage).await?))
}

/// All deals grouped under every stage
pub async fn deals_by_stage(State(state): State<AppState>) -> Json<BTreeMap<DealStage, Vec<Deal>>> {
    Json(state.crm.deals.by_stage().await)
}

/// Count and value per stage
pub async fn pipeline_summary(State(state): State<AppState>) -> Json<Vec<StageSummary>> {
    Json(state.crm.deals.pipeline_summary().await)
}

pub async fn list_stages() -> Json<LabelsResponse> {
    Json(LabelsResponse {
        labels: deal_stages().iter().map(|s| s.label()).collect(),
    })
}
