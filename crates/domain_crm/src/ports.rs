//! Record Store Port
//!
//! The hosted backend exposes one generic protocol for every table. The
//! `RecordStore` trait mirrors that protocol one-to-one so that the entity
//! layer can be written once and run against any adapter:
//!
//! - **HTTP Adapter**: calls the hosted store (`infra_remote`)
//! - **In-memory Adapter**: evaluates queries locally, for tests and demos
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_crm::ports::RecordStore;
//! use domain_crm::wire::Query;
//!
//! let response = store
//!     .fetch_records("contact_c", &Query::select(["firstName_c", "email_c"]))
//!     .await?;
//! if response.success {
//!     let rows = response.into_records();
//! }
//! ```
//!
//! Adapters return `Err(PortError)` only when no store envelope could be
//! obtained (network, timeout, undecodable body). A store that answers with
//! `success: false` is an `Ok` response; interpreting it is the caller's job.

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, PortError};

use crate::wire::{DeletePayload, MutationPayload, Query, StoreResponse};

/// Port to the hosted record store
#[async_trait]
pub trait RecordStore: DomainPort + HealthCheckable {
    /// Fetches the records of `table` matching `query`
    async fn fetch_records(&self, table: &str, query: &Query) -> Result<StoreResponse, PortError>;

    /// Fetches one record by primary key, projecting `query.fields`
    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        query: &Query,
    ) -> Result<StoreResponse, PortError>;

    /// Inserts every record in the payload; ids are assigned by the store
    async fn create_record(
        &self,
        table: &str,
        payload: &MutationPayload,
    ) -> Result<StoreResponse, PortError>;

    /// Updates every record in the payload; each must carry `Id`
    async fn update_record(
        &self,
        table: &str,
        payload: &MutationPayload,
    ) -> Result<StoreResponse, PortError>;

    /// Deletes the listed record ids
    async fn delete_record(
        &self,
        table: &str,
        payload: &DeletePayload,
    ) -> Result<StoreResponse, PortError>;
}

/// In-memory record store for testing
///
/// Evaluates the query protocol against tables held in memory and reports
/// per-record results the way the hosted store does. Failure knobs allow
/// tests to simulate transport errors, store-level rejections, and
/// individual record rejections.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::cmp::Ordering;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Mutex;

    use chrono::Utc;
    use serde_json::Value;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    use crate::wire::{
        Condition, GroupCondition, GroupOperator, Operator, RawRecord, RecordResult,
        SortDirection, SubGroup, WhereGroup, ID_FIELD,
    };

    #[derive(Debug, Clone)]
    struct Rejection {
        field: String,
        value: Value,
        message: String,
    }

    #[derive(Debug, Default)]
    struct FailureKnobs {
        transport: Option<String>,
        store: Option<String>,
        rejections: Vec<Rejection>,
    }

    /// In-memory implementation of RecordStore
    #[derive(Debug)]
    pub struct InMemoryRecordStore {
        tables: RwLock<HashMap<String, BTreeMap<i64, RawRecord>>>,
        next_id: AtomicI64,
        calls: AtomicUsize,
        knobs: Mutex<FailureKnobs>,
    }

    impl Default for InMemoryRecordStore {
        fn default() -> Self {
            Self {
                tables: RwLock::new(HashMap::new()),
                next_id: AtomicI64::new(1),
                calls: AtomicUsize::new(0),
                knobs: Mutex::new(FailureKnobs::default()),
            }
        }
    }

    impl InMemoryRecordStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Inserts raw rows as-is, assigning ids to rows without one
        ///
        /// Seeding does not count as a call.
        pub async fn seed(&self, table: &str, rows: Vec<RawRecord>) -> Vec<i64> {
            let mut tables = self.tables.write().await;
            let rows_by_id = tables.entry(table.to_string()).or_default();
            let mut ids = Vec::with_capacity(rows.len());
            for mut row in rows {
                let id = match row.get(ID_FIELD).and_then(Value::as_i64) {
                    Some(id) => {
                        self.next_id.fetch_max(id + 1, AtomicOrdering::SeqCst);
                        id
                    }
                    None => self.allocate_id(),
                };
                row.insert(ID_FIELD.to_string(), Value::from(id));
                rows_by_id.insert(id, row);
                ids.push(id);
            }
            ids
        }

        /// Returns the stored row, unprojected
        pub async fn row(&self, table: &str, id: i64) -> Option<RawRecord> {
            self.tables
                .read()
                .await
                .get(table)
                .and_then(|rows| rows.get(&id))
                .cloned()
        }

        /// Number of rows held for `table`
        pub async fn len(&self, table: &str) -> usize {
            self.tables.read().await.get(table).map_or(0, BTreeMap::len)
        }

        /// Number of port calls made so far
        pub fn call_count(&self) -> usize {
            self.calls.load(AtomicOrdering::SeqCst)
        }

        /// Makes every call fail before reaching the store
        pub fn set_transport_failure(&self, message: Option<&str>) {
            self.knobs().transport = message.map(str::to_string);
        }

        /// Makes every call return `success: false` with `message`
        pub fn set_store_failure(&self, message: Option<&str>) {
            self.knobs().store = message.map(str::to_string);
        }

        /// Rejects any created or updated record whose `field` equals `value`
        pub fn reject_when(&self, field: &str, value: impl Into<Value>, message: &str) {
            self.knobs().rejections.push(Rejection {
                field: field.to_string(),
                value: value.into(),
                message: message.to_string(),
            });
        }

        /// Clears all failure knobs
        pub fn reset_failures(&self) {
            *self.knobs() = FailureKnobs::default();
        }

        fn knobs(&self) -> std::sync::MutexGuard<'_, FailureKnobs> {
            self.knobs.lock().unwrap_or_else(|e| e.into_inner())
        }

        fn allocate_id(&self) -> i64 {
            self.next_id.fetch_add(1, AtomicOrdering::SeqCst)
        }

        /// Counts the call and applies transport/store failure knobs
        fn enter(&self, operation: &str) -> Result<Option<StoreResponse>, PortError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            let knobs = self.knobs();
            if let Some(message) = &knobs.transport {
                return Err(PortError::connection(format!("{}: {}", operation, message)));
            }
            Ok(knobs.store.as_ref().map(StoreResponse::failure))
        }

        fn rejection_for(&self, record: &RawRecord) -> Option<String> {
            self.knobs()
                .rejections
                .iter()
                .find(|r| record.get(&r.field).map_or(false, |v| values_equal(v, &r.value)))
                .map(|r| r.message.clone())
        }
    }

    impl DomainPort for InMemoryRecordStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryRecordStore {
        async fn health_check(&self) -> HealthCheckResult {
            let transport = self.knobs().transport.clone();
            HealthCheckResult {
                adapter_id: "in-memory-record-store".to_string(),
                status: if transport.is_some() {
                    AdapterHealth::Unhealthy
                } else {
                    AdapterHealth::Healthy
                },
                latency_ms: 0,
                message: transport,
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl RecordStore for InMemoryRecordStore {
        async fn fetch_records(&self, table: &str, query: &Query) -> Result<StoreResponse, PortError> {
            if let Some(failure) = self.enter("fetch_records")? {
                return Ok(failure);
            }

            let tables = self.tables.read().await;
            let mut rows: Vec<&RawRecord> = tables
                .get(table)
                .map(|rows| rows.values().filter(|row| matches_query(row, query)).collect())
                .unwrap_or_default();

            for key in query.order_by.iter().rev() {
                rows.sort_by(|a, b| {
                    let ordering = compare_nulls_last(a.get(&key.field), b.get(&key.field));
                    match key.direction {
                        SortDirection::Ascending => ordering,
                        SortDirection::Descending => ordering.reverse(),
                    }
                });
            }

            let (offset, limit) = query
                .paging
                .map(|p| (p.offset as usize, p.limit as usize))
                .unwrap_or((0, usize::MAX));

            let data: Vec<Value> = rows
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|row| Value::Object(project(row, query)))
                .collect();

            Ok(StoreResponse::ok(Value::Array(data)))
        }

        async fn get_record_by_id(
            &self,
            table: &str,
            id: i64,
            query: &Query,
        ) -> Result<StoreResponse, PortError> {
            if let Some(failure) = self.enter("get_record_by_id")? {
                return Ok(failure);
            }

            let tables = self.tables.read().await;
            match tables.get(table).and_then(|rows| rows.get(&id)) {
                Some(row) => Ok(StoreResponse::ok(Value::Object(project(row, query)))),
                None => Ok(StoreResponse::failure(format!("Record with Id {} does not exist", id))),
            }
        }

        async fn create_record(
            &self,
            table: &str,
            payload: &MutationPayload,
        ) -> Result<StoreResponse, PortError> {
            if let Some(failure) = self.enter("create_record")? {
                return Ok(failure);
            }

            let mut tables = self.tables.write().await;
            let rows = tables.entry(table.to_string()).or_default();
            let mut results = Vec::with_capacity(payload.records.len());
            for record in &payload.records {
                if let Some(message) = self.rejection_for(record) {
                    results.push(RecordResult::failed(None, message));
                    continue;
                }
                let id = self.allocate_id();
                let mut row = record.clone();
                row.insert(ID_FIELD.to_string(), Value::from(id));
                rows.insert(id, row.clone());
                results.push(RecordResult::succeeded(row));
            }
            Ok(StoreResponse::with_results(results))
        }

        async fn update_record(
            &self,
            table: &str,
            payload: &MutationPayload,
        ) -> Result<StoreResponse, PortError> {
            if let Some(failure) = self.enter("update_record")? {
                return Ok(failure);
            }

            let mut tables = self.tables.write().await;
            let rows = tables.entry(table.to_string()).or_default();
            let mut results = Vec::with_capacity(payload.records.len());
            for record in &payload.records {
                let Some(id) = record.get(ID_FIELD).and_then(Value::as_i64) else {
                    results.push(RecordResult::failed(None, "Id is required for update"));
                    continue;
                };
                if let Some(message) = self.rejection_for(record) {
                    results.push(RecordResult::failed(Some(id), message));
                    continue;
                }
                match rows.get_mut(&id) {
                    Some(row) => {
                        for (field, value) in record {
                            row.insert(field.clone(), value.clone());
                        }
                        results.push(RecordResult::succeeded(row.clone()));
                    }
                    None => results.push(RecordResult::failed(
                        Some(id),
                        format!("Record with Id {} does not exist", id),
                    )),
                }
            }
            Ok(StoreResponse::with_results(results))
        }

        async fn delete_record(
            &self,
            table: &str,
            payload: &DeletePayload,
        ) -> Result<StoreResponse, PortError> {
            if let Some(failure) = self.enter("delete_record")? {
                return Ok(failure);
            }

            let mut tables = self.tables.write().await;
            let rows = tables.entry(table.to_string()).or_default();
            let results = payload
                .record_ids
                .iter()
                .map(|&id| match rows.remove(&id) {
                    Some(_) => RecordResult {
                        success: true,
                        data: None,
                        message: None,
                        id: Some(id),
                    },
                    None => RecordResult::failed(
                        Some(id),
                        format!("Record with Id {} does not exist", id),
                    ),
                })
                .collect();
            Ok(StoreResponse::with_results(results))
        }
    }

    fn project(row: &RawRecord, query: &Query) -> RawRecord {
        if query.fields.is_empty() {
            return row.clone();
        }
        let mut projected = RawRecord::new();
        if let Some(id) = row.get(ID_FIELD) {
            projected.insert(ID_FIELD.to_string(), id.clone());
        }
        for name in query.field_names() {
            projected.insert(name.to_string(), row.get(name).cloned().unwrap_or(Value::Null));
        }
        projected
    }

    fn matches_query(row: &RawRecord, query: &Query) -> bool {
        query.conditions.iter().all(|c| matches_condition(row, c))
            && query.where_groups.iter().all(|g| matches_group(row, g))
    }

    fn matches_condition(row: &RawRecord, condition: &Condition) -> bool {
        evaluate(row.get(&condition.field), condition.operator, &condition.values)
    }

    fn matches_group(row: &RawRecord, group: &WhereGroup) -> bool {
        let mut outcomes = group.sub_groups.iter().map(|s| matches_sub_group(row, s));
        match group.operator {
            GroupOperator::Or => outcomes.any(|m| m),
            GroupOperator::And => outcomes.all(|m| m),
        }
    }

    fn matches_sub_group(row: &RawRecord, sub_group: &SubGroup) -> bool {
        let mut outcomes = sub_group
            .conditions
            .iter()
            .map(|c: &GroupCondition| evaluate(row.get(&c.field), c.operator, &c.values));
        match sub_group.operator.unwrap_or(GroupOperator::And) {
            GroupOperator::Or => outcomes.any(|m| m),
            GroupOperator::And => outcomes.all(|m| m),
        }
    }

    fn evaluate(actual: Option<&Value>, operator: Operator, values: &[Value]) -> bool {
        let actual = match actual {
            Some(Value::Object(lookup)) => lookup.get(ID_FIELD).unwrap_or(&Value::Null),
            Some(value) => value,
            None => &Value::Null,
        };
        values.iter().any(|expected| match operator {
            Operator::EqualTo => values_equal(actual, expected),
            Operator::NotEqualTo => !values_equal(actual, expected),
            Operator::GreaterThan => compare(actual, expected) == Some(Ordering::Greater),
            Operator::GreaterThanOrEqualTo => matches!(
                compare(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::LessThan => compare(actual, expected) == Some(Ordering::Less),
            Operator::LessThanOrEqualTo => matches!(
                compare(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Contains => match (actual, expected) {
                (Value::String(haystack), Value::String(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
        })
    }

    fn values_equal(a: &Value, b: &Value) -> bool {
        a == b || compare(a, b) == Some(Ordering::Equal)
    }

    fn compare(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            _ => None,
        }
    }

    fn compare_nulls_last(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        let a = a.filter(|v| !v.is_null());
        let b = b.filter(|v| !v.is_null());
        match (a, b) {
            (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}
