//! Generic entity repository
//!
//! `EntityRepository<S>` implements the whole access contract once; the
//! schema descriptor `S` supplies the table, fields, and coercion rules.
//! Entity-specific queries (deal stages, upcoming activities, contact
//! export) live next to their entity as extra `impl EntityRepository<X>`
//! blocks.
//!
//! | Operation | Policy | Failure |
//! |---|---|---|
//! | `list`, `search`, `find_by_reference` | degrade | empty `Vec` |
//! | `fetch` | propagate | `Transport` |
//! | `get_by_id` | propagate | `NotFound`, `Transport` |
//! | `create` / `update` / `delete` | propagate | `Validation`, `Create`/`Update`/`Delete`, `Transport` |
//! | `bulk_update` / `bulk_delete` | per record | failures listed in the outcome |

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use core_kernel::{Clock, PortError, RecordKey, SystemClock};

use crate::bulk::{pair_results, BulkDeleteOutcome, BulkFailure, BulkUpdateOutcome};
use crate::error::{CrmError, MutationKind, RecordFailure};
use crate::policy::ErrorPolicy;
use crate::ports::RecordStore;
use crate::schema::{build_create_record, build_update_record, to_raw_input, EntitySchema};
use crate::wire::{DeletePayload, MutationPayload, Operator, Query, RawRecord, RecordResult, StoreResponse};

/// Data access for one entity table
pub struct EntityRepository<S: EntitySchema> {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    _schema: PhantomData<fn() -> S>,
}

impl<S: EntitySchema> Clone for EntityRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            _schema: PhantomData,
        }
    }
}

impl<S: EntitySchema> fmt::Debug for EntityRepository<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRepository")
            .field("entity", &S::ENTITY)
            .field("table", &S::TABLE)
            .finish()
    }
}

impl<S: EntitySchema> EntityRepository<S> {
    /// Creates a repository stamping records with wall-clock time
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Creates a repository with an explicit clock
    pub fn with_clock(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            _schema: PhantomData,
        }
    }

    /// The store this repository talks to
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// A query projecting the entity's declared fields
    pub fn base_query() -> Query {
        Query::select(S::projection())
    }

    pub(crate) fn degrade<T: Default>(&self, operation: &'static str, result: Result<T, CrmError>) -> T {
        ErrorPolicy::degrade(S::ENTITY, operation, result)
    }

    fn propagate<T>(&self, operation: &'static str, result: Result<T, CrmError>) -> Result<T, CrmError> {
        ErrorPolicy::propagate(S::ENTITY, operation, result)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Every record of the table; empty on any failure
    #[instrument(skip(self), fields(entity = S::ENTITY))]
    pub async fn list(&self) -> Vec<S> {
        self.degrade("list", self.fetch(&Self::base_query()).await)
    }

    /// Runs an arbitrary query and decodes the rows
    ///
    /// Unlike the list-shaped operations this propagates failures. Rows that
    /// do not decode are skipped with a warning.
    pub async fn fetch(&self, query: &Query) -> Result<Vec<S>, CrmError> {
        let response = self.store.fetch_records(S::TABLE, query).await?;
        if !response.success {
            return Err(store_rejected(response.message));
        }
        let records = decode_rows::<S>(response.into_records());
        debug!(entity = S::ENTITY, count = records.len(), "Fetched records");
        Ok(records)
    }

    /// One record by primary key
    #[instrument(skip(self), fields(entity = S::ENTITY, id = %id))]
    pub async fn get_by_id(&self, id: S::Id) -> Result<S, CrmError> {
        let result = self.fetch_one(id).await;
        self.propagate("get_by_id", result)
    }

    async fn fetch_one(&self, id: S::Id) -> Result<S, CrmError> {
        let response = self
            .store
            .get_record_by_id(S::TABLE, id.raw(), &Self::base_query())
            .await?;
        if !response.success {
            return Err(CrmError::NotFound {
                entity: S::ENTITY,
                id: id.raw(),
                message: response.message,
            });
        }
        match response.into_record() {
            Some(row) => decode_row::<S>(row),
            None => Err(CrmError::not_found(S::ENTITY, id.raw())),
        }
    }

    /// Records whose search fields contain `term`, case-insensitively
    ///
    /// A blank term lists everything.
    #[instrument(skip(self), fields(entity = S::ENTITY))]
    pub async fn search(&self, term: &str) -> Vec<S> {
        let term = term.trim();
        if term.is_empty() || S::SEARCH_FIELDS.is_empty() {
            return self.list().await;
        }
        let query = Self::base_query().any_of(S::SEARCH_FIELDS.iter().copied(), Operator::Contains, term);
        self.degrade("search", self.fetch(&query).await)
    }

    /// Records whose foreign key `field` points at `target`
    #[instrument(skip(self), fields(entity = S::ENTITY, target = %target))]
    pub async fn find_by_reference<K: RecordKey>(&self, field: &'static str, target: K) -> Vec<S> {
        let query = Self::base_query().filter(field, Operator::EqualTo, target.raw());
        self.degrade("find_by_reference", self.fetch(&query).await)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Inserts one record and returns it with its assigned id
    #[instrument(skip(self, input), fields(entity = S::ENTITY))]
    pub async fn create<I: Serialize + ?Sized>(&self, input: &I) -> Result<S, CrmError> {
        let result = self.create_inner(input).await;
        self.propagate("create", result)
    }

    async fn create_inner<I: Serialize + ?Sized>(&self, input: &I) -> Result<S, CrmError> {
        let raw = to_raw_input(input)?;
        let record = build_create_record::<S>(&raw, self.now())?;
        let response = self
            .store
            .create_record(S::TABLE, &MutationPayload::single(record))
            .await?;
        let echoed = response.data.clone();
        let created = settle::<S>(MutationKind::Create, response)?;
        // Stores that skip per-record results echo the row in `data`
        match created.into_iter().next().and_then(|r| r.data).or_else(|| first_row(echoed)) {
            Some(row) => decode_row::<S>(row),
            None => Err(CrmError::mutation(
                MutationKind::Create,
                S::ENTITY,
                "store returned no record",
                Vec::new(),
            )),
        }
    }

    /// Overwrites the supplied fields of one record
    #[instrument(skip(self, input), fields(entity = S::ENTITY, id = %id))]
    pub async fn update<I: Serialize + ?Sized>(&self, id: S::Id, input: &I) -> Result<S, CrmError> {
        let result = self.update_inner(id, input).await;
        self.propagate("update", result)
    }

    async fn update_inner<I: Serialize + ?Sized>(&self, id: S::Id, input: &I) -> Result<S, CrmError> {
        let raw = to_raw_input(input)?;
        let record = build_update_record::<S>(id.raw(), &raw, self.now())?;
        let response = self
            .store
            .update_record(S::TABLE, &MutationPayload::single(record))
            .await?;
        let updated = settle::<S>(MutationKind::Update, response)?;
        match updated.into_iter().next().and_then(|r| r.data) {
            Some(row) => decode_row::<S>(row),
            // Some stores acknowledge without echoing the row
            None => self.fetch_one(id).await,
        }
    }

    /// Deletes one record; `Ok(true)` once the store confirms
    #[instrument(skip(self), fields(entity = S::ENTITY, id = %id))]
    pub async fn delete(&self, id: S::Id) -> Result<bool, CrmError> {
        let result = self.delete_inner(id).await;
        self.propagate("delete", result)
    }

    async fn delete_inner(&self, id: S::Id) -> Result<bool, CrmError> {
        let payload = DeletePayload {
            record_ids: vec![id.raw()],
        };
        let response = self.store.delete_record(S::TABLE, &payload).await?;
        let results = settle::<S>(MutationKind::Delete, response)?;
        if results.is_empty() {
            return Ok(true);
        }
        match pair_results(&[id.raw()], &results).pop() {
            Some((_, Some(RecordResult { success: true, .. }))) => Ok(true),
            _ => Err(CrmError::mutation(
                MutationKind::Delete,
                S::ENTITY,
                "No result reported",
                vec![RecordFailure {
                    id: Some(id.raw()),
                    message: "No result reported".to_string(),
                }],
            )),
        }
    }

    // ========================================================================
    // Bulk
    // ========================================================================

    /// Applies the same patch to every id in one batched call
    #[instrument(skip(self, patch), fields(entity = S::ENTITY, count = ids.len()))]
    pub async fn bulk_update<I: Serialize + ?Sized>(&self, ids: &[S::Id], patch: &I) -> BulkUpdateOutcome<S> {
        let raw_ids: Vec<i64> = ids.iter().map(RecordKey::raw).collect();
        if raw_ids.is_empty() {
            return BulkUpdateOutcome::empty();
        }

        let now = self.now();
        let records = to_raw_input(patch).and_then(|raw| {
            raw_ids
                .iter()
                .map(|&id| build_update_record::<S>(id, &raw, now))
                .collect::<Result<Vec<RawRecord>, CrmError>>()
        });
        let records = match records {
            Ok(records) => records,
            Err(e) => return BulkUpdateOutcome::failed(&raw_ids, e.to_string()),
        };

        let results = match self.batch_results(
            self.store.update_record(S::TABLE, &MutationPayload { records }).await,
            "update",
        ) {
            Ok(results) => results,
            Err(message) => return BulkUpdateOutcome::failed(&raw_ids, message),
        };

        let mut outcome = BulkUpdateOutcome::empty();
        for (id, result) in pair_results(&raw_ids, &results) {
            match result {
                Some(RecordResult { success: true, data, .. }) => {
                    outcome.success_count += 1;
                    if let Some(row) = data {
                        match decode_row::<S>(row) {
                            Ok(record) => outcome.updated.push(record),
                            Err(e) => warn!(entity = S::ENTITY, id, error = %e, "Updated record did not decode"),
                        }
                    }
                }
                Some(RecordResult { message, .. }) => {
                    outcome.error_count += 1;
                    outcome
                        .errors
                        .push(BulkFailure::single(id, message.unwrap_or_else(|| default_message("update"))));
                }
                None => {
                    outcome.error_count += 1;
                    outcome.errors.push(BulkFailure::single(id, "No result reported"));
                }
            }
        }
        log_bulk(S::ENTITY, "bulk_update", outcome.success_count, outcome.error_count);
        outcome
    }

    /// Deletes every id in one batched call
    #[instrument(skip(self), fields(entity = S::ENTITY, count = ids.len()))]
    pub async fn bulk_delete(&self, ids: &[S::Id]) -> BulkDeleteOutcome<S::Id> {
        let raw_ids: Vec<i64> = ids.iter().map(RecordKey::raw).collect();
        if raw_ids.is_empty() {
            return BulkDeleteOutcome::empty();
        }

        let payload = DeletePayload {
            record_ids: raw_ids.clone(),
        };
        let results = match self.batch_results(self.store.delete_record(S::TABLE, &payload).await, "delete") {
            Ok(results) => results,
            Err(message) => return BulkDeleteOutcome::failed(&raw_ids, message),
        };

        let mut outcome = BulkDeleteOutcome::empty();
        for (id, result) in pair_results(&raw_ids, &results) {
            match result {
                Some(RecordResult { success: true, .. }) => {
                    outcome.success_count += 1;
                    outcome.deleted.push(S::Id::from_raw(id));
                }
                Some(RecordResult { message, .. }) => {
                    outcome.error_count += 1;
                    outcome
                        .errors
                        .push(BulkFailure::single(id, message.unwrap_or_else(|| default_message("delete"))));
                }
                None => {
                    outcome.error_count += 1;
                    outcome.errors.push(BulkFailure::single(id, "No result reported"));
                }
            }
        }
        log_bulk(S::ENTITY, "bulk_delete", outcome.success_count, outcome.error_count);
        outcome
    }

    /// Per-record results of a batch, or the message explaining why there are none
    fn batch_results(
        &self,
        response: Result<StoreResponse, PortError>,
        verb: &str,
    ) -> Result<Vec<RecordResult>, String> {
        match response {
            Ok(response) if response.success => Ok(response.results.unwrap_or_default()),
            Ok(response) => Err(response
                .message
                .unwrap_or_else(|| format!("Failed to {} {} records", verb, S::ENTITY))),
            Err(e) => {
                warn!(entity = S::ENTITY, error = %e, "Bulk {} failed before reaching the store", verb);
                Err(CrmError::from(e).to_string())
            }
        }
    }

}

/// Judges a mutation response, collecting every per-record failure
fn settle<S: EntitySchema>(kind: MutationKind, response: StoreResponse) -> Result<Vec<RecordResult>, CrmError> {
    if !response.success {
        let message = response
            .message
            .unwrap_or_else(|| format!("Failed to {} {}", kind.verb(), S::ENTITY));
        return Err(CrmError::mutation(kind, S::ENTITY, message, Vec::new()));
    }

    let results = response.results.unwrap_or_default();
    let failures: Vec<RecordFailure> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| RecordFailure {
            id: r.id,
            message: r.message.clone().unwrap_or_else(|| default_message(kind.verb())),
        })
        .collect();

    if let Some(first) = failures.first() {
        warn!(
            entity = S::ENTITY,
            failed = failures.len(),
            "Failed to {} {} records",
            kind.verb(),
            failures.len()
        );
        let message = first.message.clone();
        return Err(CrmError::mutation(kind, S::ENTITY, message, failures));
    }
    Ok(results)
}

/// First record carried in a response's `data`, whether one record or a list
fn first_row(data: Option<Value>) -> Option<RawRecord> {
    match data? {
        Value::Object(row) => Some(row),
        Value::Array(rows) => rows.into_iter().find_map(|v| match v {
            Value::Object(row) => Some(row),
            _ => None,
        }),
        _ => None,
    }
}

fn decode_row<S: EntitySchema>(row: RawRecord) -> Result<S, CrmError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| {
        CrmError::Transport(PortError::transformation(format!(
            "{} record does not match schema: {}",
            S::ENTITY,
            e
        )))
    })
}

fn decode_rows<S: EntitySchema>(rows: Vec<RawRecord>) -> Vec<S> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("Id").cloned();
            match decode_row::<S>(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(entity = S::ENTITY, id = ?id, error = %e, "Skipping undecodable record");
                    None
                }
            }
        })
        .collect()
}

fn store_rejected(message: Option<String>) -> CrmError {
    CrmError::Transport(PortError::internal(format!(
        "store rejected request: {}",
        message.unwrap_or_else(|| "no message".to_string())
    )))
}

fn default_message(verb: &str) -> String {
    format!("Failed to {} record", verb)
}

fn log_bulk(entity: &'static str, operation: &'static str, succeeded: usize, failed: usize) {
    if failed > 0 {
        warn!(entity, operation, succeeded, failed, "Bulk operation partially failed");
    } else {
        debug!(entity, operation, succeeded, "Bulk operation completed");
    }
}
