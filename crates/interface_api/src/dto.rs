//! Request and response bodies that are not entity records themselves

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object body forwarded to the record layer after validation
///
/// Kept untyped so explicit `null`s reach the store and clear fields.
pub type RecordBody = Map<String, Value>;

/// `?q=` on list routes
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Filters on `GET /activities`
#[derive(Debug, Default, Deserialize)]
pub struct ActivityFilter {
    pub q: Option<String>,
    pub contact_id: Option<i64>,
    pub deal_id: Option<i64>,
}

/// `?limit=` on `GET /activities/upcoming`
#[derive(Debug, Default, Deserialize)]
pub struct UpcomingParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateRequest {
    pub ids: Vec<i64>,
    pub patch: RecordBody,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StageUpdateRequest {
    pub stage: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub id: i64,
    pub deleted: bool,
}

/// A closed set of labels (deal stages, activity types)
#[derive(Debug, Serialize)]
pub struct LabelsResponse {
    pub labels: Vec<&'static str>,
}
