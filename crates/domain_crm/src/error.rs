//! CRM domain errors
//!
//! Every access operation fails with one of these kinds. Store-reported
//! per-record failures are collected in full before the error is raised, so
//! callers see the first message in `Display` and the whole set through
//! [`CrmError::failures`].

use serde::Serialize;
use thiserror::Error;

use core_kernel::PortError;

/// One record the store refused to persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    /// Record the failure refers to, when the store reported it
    pub id: Option<i64>,
    /// Store-supplied message
    pub message: String,
}

/// The kind of mutation that was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    /// Verb used in fallback messages ("Failed to create contact")
    pub fn verb(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

/// Errors that can occur in the CRM access layer
#[derive(Debug, Error)]
pub enum CrmError {
    /// The record is absent or the store reported a failed lookup
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: i64,
        message: Option<String>,
    },

    /// Input rejected before any remote call was made
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The store refused an insert
    #[error("Failed to create {entity}: {message}")]
    Create {
        entity: &'static str,
        message: String,
        failures: Vec<RecordFailure>,
    },

    /// The store refused an update
    #[error("Failed to update {entity}: {message}")]
    Update {
        entity: &'static str,
        message: String,
        failures: Vec<RecordFailure>,
    },

    /// The store refused a delete
    #[error("Failed to delete {entity}: {message}")]
    Delete {
        entity: &'static str,
        message: String,
        failures: Vec<RecordFailure>,
    },

    /// Network, client construction, or decoding failure
    #[error("Transport error: {0}")]
    Transport(#[from] PortError),
}

impl CrmError {
    /// Creates a NotFound error
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CrmError::NotFound {
            entity,
            id,
            message: None,
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        CrmError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error tied to one field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        CrmError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates the error matching a rejected mutation
    pub fn mutation(
        kind: MutationKind,
        entity: &'static str,
        message: impl Into<String>,
        failures: Vec<RecordFailure>,
    ) -> Self {
        let message = message.into();
        match kind {
            MutationKind::Create => CrmError::Create { entity, message, failures },
            MutationKind::Update => CrmError::Update { entity, message, failures },
            MutationKind::Delete => CrmError::Delete { entity, message, failures },
        }
    }

    /// Returns every per-record failure carried by this error
    pub fn failures(&self) -> &[RecordFailure] {
        match self {
            CrmError::Create { failures, .. }
            | CrmError::Update { failures, .. }
            | CrmError::Delete { failures, .. } => failures,
            _ => &[],
        }
    }

    /// Returns true if this error indicates the record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, CrmError::NotFound { .. })
    }

    /// Returns true if the input was rejected before reaching the store
    pub fn is_validation(&self) -> bool {
        matches!(self, CrmError::Validation { .. })
    }

    /// Returns true if the failure happened below the store protocol
    pub fn is_transport(&self) -> bool {
        matches!(self, CrmError::Transport(_))
    }
}
