//! Core Kernel - Foundational types and utilities for the CRM system
//!
//! This crate provides the fundamental building blocks used across all crates:
//! - Strongly-typed integer record identifiers
//! - Clocks for stamping record timestamps
//! - Port error and health-check abstractions shared by adapters

pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use temporal::{Clock, SystemClock, ManualClock, format_timestamp, parse_timestamp};
pub use identifiers::{RecordKey, ContactId, CompanyId, DealId, ActivityId};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
