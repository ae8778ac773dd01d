//! Activity handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use core_kernel::{ActivityId, ContactId, DealId, RecordKey};
use domain_crm::{activity_types, Activity, ActivityInput, DEFAULT_UPCOMING_LIMIT};

use super::{create_record, delete_record, list_or_search, update_record};
use crate::dto::{ActivityFilter, DeleteResponse, LabelsResponse, RecordBody, UpcomingParams};
use crate::{error::ApiError, AppState};

/// Lists activities, narrowed by `?contact_id=`, `?deal_id=`, or `?q=`
pub async fn list_activities(
    State(state): State<AppState>,
    Query(filter): Query<ActivityFilter>,
) -> Json<Vec<Activity>> {
    let activities = &state.crm.activities;
    let found = match filter {
        ActivityFilter { contact_id: Some(id), .. } => activities.by_contact(ContactId::from_raw(id)).await,
        ActivityFilter { deal_id: Some(id), .. } => activities.by_deal(DealId::from_raw(id)).await,
        ActivityFilter { q, .. } => list_or_search(activities, q).await,
    };
    Json(found)
}

/// Creates an activity
pub async fn create_activity(
    State(state): State<AppState>,
    Json(body): Json<RecordBody>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    create_record::<_, ActivityInput>(&state.crm.activities, body).await
}

/// Gets an activity by ID
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<ActivityId>,
) -> Result<Json<Activity>, ApiError> {
    Ok(Json(state.crm.activities.get_by_id(id).await?))
}

/// Updates the supplied fields of an activity
pub async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<ActivityId>,
    Json(body): Json<RecordBody>,
) -> Result<Json<Activity>, ApiError> {
    update_record::<_, ActivityInput>(&state.crm.activities, id, body).await
}

/// Deletes an activity
pub async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<ActivityId>,
) -> Result<Json<DeleteResponse>, ApiError> {
    delete_record(&state.crm.activities, id).await
}

/// Marks an activity done
pub async fn complete_activity(
    State(state): State<AppState>,
    Path(id): Path<ActivityId>,
) -> Result<Json<Activity>, ApiError> {
    Ok(Json(state.crm.activities.mark_completed(id).await?))
}

/// Open activities due from now on, soonest first
pub async fn upcoming_activities(
    State(state): State<AppState>,
    Query(params): Query<UpcomingParams>,
) -> Json<Vec<Activity>> {
    let limit = params.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);
    Json(state.crm.activities.upcoming(limit).await)
}

/// Open activities past their due date
pub async fn overdue_activities(State(state): State<AppState>) -> Json<Vec<Activity>> {
    Json(state.crm.activities.overdue().await)
}

pub async fn list_types() -> Json<LabelsResponse> {
    Json(LabelsResponse {
        labels: activity_types().iter().map(|t| t.label()).collect(),
    })
}
