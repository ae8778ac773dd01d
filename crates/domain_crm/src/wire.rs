//! Record store wire protocol
//!
//! The hosted store speaks one generic protocol for every table: a query
//! object for reads, a `{records: [...]}` payload for inserts and updates, a
//! `{RecordIds: [...]}` payload for deletes, and a uniform response envelope
//! with a `success` flag plus optional per-record results.
//!
//! The field casing below is the store's, including the mix of `FieldName`
//! in flat conditions and `fieldName` inside condition groups.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record as the store sees it: field name to scalar value
pub type RawRecord = Map<String, Value>;

/// Primary key field present on every record
pub const ID_FIELD: &str = "Id";

/// Field selector, serialized as `{"field": {"Name": "..."}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub field: FieldName,
}

/// Inner name object of a field selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

impl FieldSelector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            field: FieldName { name: name.into() },
        }
    }
}

/// Comparison operators understood by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    Contains,
}

/// A top-level filter; all of them must hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "FieldName")]
    pub field: String,
    #[serde(rename = "Operator")]
    pub operator: Operator,
    #[serde(rename = "Values")]
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            values: vec![value.into()],
        }
    }
}

/// Logical connective for condition groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupOperator {
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "AND")]
    And,
}

/// A condition inside a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCondition {
    #[serde(rename = "fieldName")]
    pub field: String,
    pub operator: Operator,
    pub values: Vec<Value>,
}

/// Conditions combined with AND (or the sub-group's own operator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubGroup {
    pub conditions: Vec<GroupCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<GroupOperator>,
}

/// Sub-groups combined with the group operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereGroup {
    pub operator: GroupOperator,
    #[serde(rename = "subGroups")]
    pub sub_groups: Vec<SubGroup>,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

/// One ordering key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field: String,
    #[serde(rename = "sorttype")]
    pub direction: SortDirection,
}

/// Page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

/// Read query for `fetch_records` / `get_record_by_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub fields: Vec<FieldSelector>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(rename = "whereGroups", default, skip_serializing_if = "Vec::is_empty")]
    pub where_groups: Vec<WhereGroup>,
    #[serde(rename = "orderBy", default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "pagingInfo", default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<PagingInfo>,
}

impl Query {
    /// Creates a query projecting the given fields
    pub fn select<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(FieldSelector::new).collect(),
            ..Default::default()
        }
    }

    /// Adds a top-level condition
    pub fn filter(mut self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::new(field, operator, value));
        self
    }

    /// Adds a group matching when any of the single-condition sub-groups matches
    pub fn any_of<I, S>(mut self, fields: I, operator: Operator, value: impl Into<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let value = value.into();
        let sub_groups = fields
            .into_iter()
            .map(|field| SubGroup {
                conditions: vec![GroupCondition {
                    field: field.into(),
                    operator,
                    values: vec![value.clone()],
                }],
                operator: None,
            })
            .collect();
        self.where_groups.push(WhereGroup {
            operator: GroupOperator::Or,
            sub_groups,
        });
        self
    }

    /// Adds an ordering key
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.paging = Some(PagingInfo { limit, offset });
        self
    }

    /// Names of the projected fields
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.name.as_str())
    }
}

/// Insert or update payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationPayload {
    pub records: Vec<RawRecord>,
}

impl MutationPayload {
    pub fn single(record: RawRecord) -> Self {
        Self { records: vec![record] }
    }
}

/// Delete payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePayload {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<i64>,
}

/// Outcome for one record of a batched mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RawRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl RecordResult {
    pub fn succeeded(data: RawRecord) -> Self {
        let id = data.get(ID_FIELD).and_then(Value::as_i64);
        Self {
            success: true,
            data: Some(data),
            message: None,
            id,
        }
    }

    pub fn failed(id: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            id,
        }
    }
}

/// Response envelope shared by every store call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RecordResult>>,
}

impl StoreResponse {
    /// A successful read carrying `data`
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    /// A successful batched mutation
    pub fn with_results(results: Vec<RecordResult>) -> Self {
        Self {
            success: true,
            results: Some(results),
            ..Default::default()
        }
    }

    /// A store-level failure
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Records carried in `data`, whether it holds one record or a list
    pub fn into_records(self) -> Vec<RawRecord> {
        match self.data {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            Some(Value::Object(map)) => vec![map],
            _ => Vec::new(),
        }
    }

    /// The single record carried in `data`
    pub fn into_record(self) -> Option<RawRecord> {
        self.into_records().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_serializes_in_store_casing() {
        let query = Query::select(["subject_c", "dueDate_c"])
            .filter("completed_c", Operator::EqualTo, false)
            .order_by("dueDate_c", SortDirection::Ascending)
            .paginate(10, 0);

        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["fields"][0], json!({"field": {"Name": "subject_c"}}));
        assert_eq!(
            value["where"][0],
            json!({"FieldName": "completed_c", "Operator": "EqualTo", "Values": [false]})
        );
        assert_eq!(value["orderBy"][0], json!({"fieldName": "dueDate_c", "sorttype": "ASC"}));
        assert_eq!(value["pagingInfo"], json!({"limit": 10, "offset": 0}));
        assert!(value.get("whereGroups").is_none());
    }

    #[test]
    fn test_any_of_builds_or_group() {
        let query = Query::select(["name_c"]).any_of(["name_c", "industry_c"], Operator::Contains, "tech");
        let value = serde_json::to_value(&query).unwrap();
        let group = &value["whereGroups"][0];
        assert_eq!(group["operator"], "OR");
        assert_eq!(group["subGroups"].as_array().unwrap().len(), 2);
        assert_eq!(
            group["subGroups"][1]["conditions"][0],
            json!({"fieldName": "industry_c", "operator": "Contains", "values": ["tech"]})
        );
    }

    #[test]
    fn test_response_parses_partial_results() {
        let response: StoreResponse = serde_json::from_value(json!({
            "success": true,
            "results": [
                {"success": true, "data": {"Id": 4}},
                {"success": false, "message": "Record does not exist", "Id": 99}
            ]
        }))
        .unwrap();

        let results = response.results.unwrap();
        assert!(results[0].success);
        assert_eq!(results[1].id, Some(99));
    }

    #[test]
    fn test_into_records_accepts_single_object() {
        let response = StoreResponse::ok(json!({"Id": 1, "name_c": "Acme"}));
        assert_eq!(response.into_records().len(), 1);
    }

    #[test]
    fn test_delete_payload_casing() {
        let payload = DeletePayload { record_ids: vec![1, 2] };
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({"RecordIds": [1, 2]}));
    }
}
