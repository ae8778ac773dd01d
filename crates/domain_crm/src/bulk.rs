//! Bulk operation outcomes
//!
//! A bulk update or delete is one batched store call whose results are
//! judged record by record. Partial success is a normal outcome: the
//! returned value says which ids went through and which did not, and
//! nothing is retried.

use serde::Serialize;

use crate::wire::RecordResult;

/// Failure covering one or more requested ids
///
/// Serialized as `{id, ids, error}`; `id` is present only when the failure
/// covers exactly one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Ids this failure applies to
    pub ids: Vec<i64>,
    pub error: String,
}

impl BulkFailure {
    pub fn single(id: i64, error: impl Into<String>) -> Self {
        Self::aggregate(&[id], error)
    }

    /// One entry covering the whole request
    pub fn aggregate(ids: &[i64], error: impl Into<String>) -> Self {
        Self {
            id: match ids {
                [only] => Some(*only),
                _ => None,
            },
            ids: ids.to_vec(),
            error: error.into(),
        }
    }

    pub fn covers(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }
}

/// Result of `bulk_update`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateOutcome<R> {
    pub updated: Vec<R>,
    pub errors: Vec<BulkFailure>,
    pub success_count: usize,
    pub error_count: usize,
}

/// Result of `bulk_delete`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteOutcome<K> {
    pub deleted: Vec<K>,
    pub errors: Vec<BulkFailure>,
    pub success_count: usize,
    pub error_count: usize,
}

impl<R> BulkUpdateOutcome<R> {
    /// Nothing went through; one entry explains why
    pub fn failed(ids: &[i64], error: impl Into<String>) -> Self {
        Self {
            updated: Vec::new(),
            errors: vec![BulkFailure::aggregate(ids, error)],
            success_count: 0,
            error_count: ids.len(),
        }
    }

    pub fn empty() -> Self {
        Self {
            updated: Vec::new(),
            errors: Vec::new(),
            success_count: 0,
            error_count: 0,
        }
    }

    /// Ids reported as failed
    pub fn failed_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.errors.iter().flat_map(|e| e.ids.iter().copied())
    }
}

impl<K> BulkDeleteOutcome<K> {
    /// Nothing went through; one entry explains why
    pub fn failed(ids: &[i64], error: impl Into<String>) -> Self {
        Self {
            deleted: Vec::new(),
            errors: vec![BulkFailure::aggregate(ids, error)],
            success_count: 0,
            error_count: ids.len(),
        }
    }

    pub fn empty() -> Self {
        Self {
            deleted: Vec::new(),
            errors: Vec::new(),
            success_count: 0,
            error_count: 0,
        }
    }

    /// Ids reported as failed
    pub fn failed_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.errors.iter().flat_map(|e| e.ids.iter().copied())
    }
}

/// Pairs each requested id with the store's result for it
///
/// Results that carry an `Id` are matched by id; the rest are matched by
/// position. An id with no result at all pairs with `None`.
pub(crate) fn pair_results(ids: &[i64], results: &[RecordResult]) -> Vec<(i64, Option<RecordResult>)> {
    ids.iter()
        .enumerate()
        .map(|(index, &id)| {
            let matched = results
                .iter()
                .find(|r| r.id == Some(id))
                .or_else(|| results.get(index).filter(|r| r.id.is_none()))
                .cloned();
            (id, matched)
        })
        .collect()
}
