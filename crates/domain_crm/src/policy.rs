//! Error propagation policies
//!
//! List-shaped reads feed screens that render "no data" just fine, so their
//! failures are logged and replaced by an empty result. Point reads and
//! writes need the caller to react, so their failures are logged and
//! returned. Every access operation goes through one of these two policies.

use tracing::error;

use crate::error::CrmError;

/// How a failed operation is reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log and substitute the empty value
    Degrade,
    /// Log and return the error
    Propagate,
}

impl ErrorPolicy {
    /// Applies the policy to an operation result
    ///
    /// Under `Degrade` the returned result is always `Ok`.
    pub fn apply<T: Default>(
        self,
        entity: &'static str,
        operation: &'static str,
        result: Result<T, CrmError>,
    ) -> Result<T, CrmError> {
        match self {
            ErrorPolicy::Degrade => Ok(Self::degrade(entity, operation, result)),
            ErrorPolicy::Propagate => Self::propagate(entity, operation, result),
        }
    }

    /// Logs a failure and substitutes the empty value
    pub fn degrade<T: Default>(
        entity: &'static str,
        operation: &'static str,
        result: Result<T, CrmError>,
    ) -> T {
        result.unwrap_or_else(|e| {
            error!(entity, operation, error = %e, "Read failed, returning empty result");
            T::default()
        })
    }

    /// Logs a failure and hands it back to the caller
    pub fn propagate<T>(
        entity: &'static str,
        operation: &'static str,
        result: Result<T, CrmError>,
    ) -> Result<T, CrmError> {
        result.map_err(|e| {
            error!(entity, operation, error = %e, "Operation failed");
            e
        })
    }
}
