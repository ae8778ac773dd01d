//! Remote Record Store Infrastructure
//!
//! This crate provides the production `RecordStore` adapter: an HTTP client
//! for the hosted record store that holds the CRM tables.
//!
//! # Architecture
//!
//! The domain layer only sees the `RecordStore` port. This crate implements
//! it over `reqwest`, translating transport and HTTP status failures into
//! `PortError` variants so the domain can apply its error policies without
//! knowing about HTTP.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_crm::Crm;
//! use infra_remote::remote_store;
//!
//! let crm = Crm::new(remote_store()?);
//! let contacts = crm.contacts.list().await;
//! ```

pub mod config;
pub mod error;
pub mod client;
pub mod accessor;

pub use config::ClientConfig;
pub use error::RemoteError;
pub use client::HttpRecordStore;
pub use accessor::remote_store;
