//! CRM Records Domain
//!
//! Typed access to the contacts, companies, deals, and activities a CRM
//! keeps in a hosted record store.
//!
//! # Layers
//!
//! - [`wire`]: the store's generic query / mutation / response protocol
//! - [`ports`]: the `RecordStore` port every adapter implements
//! - [`schema`]: per-entity descriptors and payload coercion
//! - [`repository`]: one generic `EntityRepository<S>` implementing the
//!   access contract for any schema
//! - [`entities`]: the four record types and their derived queries
//!
//! Reads that return lists degrade to an empty result when the store fails;
//! point reads and writes return a [`CrmError`].
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_crm::{Crm, ContactInput};
//!
//! let crm = Crm::new(store);
//! let contact = crm
//!     .contacts
//!     .create(&ContactInput {
//!         first_name: Some("Ada".to_string()),
//!         last_name: Some("Lovelace".to_string()),
//!         email: Some("ada@example.com".to_string()),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let won = crm.deals.update_stage(deal_id, "Closed Won").await?;
//! assert_eq!(won.probability, 100);
//! ```

pub mod wire;
pub mod error;
pub mod ports;
pub mod schema;
pub mod policy;
pub mod bulk;
pub mod export;
pub mod repository;
pub mod entities;
pub mod service;

pub use error::{CrmError, MutationKind, RecordFailure};
pub use ports::RecordStore;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryRecordStore;
pub use schema::{EntitySchema, FieldKind, FieldSpec, TimestampPolicy};
pub use policy::ErrorPolicy;
pub use bulk::{BulkDeleteOutcome, BulkFailure, BulkUpdateOutcome};
pub use export::TextExport;
pub use repository::EntityRepository;
pub use entities::{
    Activity, ActivityInput, ActivityType, Company, CompanyInput, Contact, ContactInput, Deal,
    DealInput, DealStage, Reference, StageSummary, DEFAULT_UPCOMING_LIMIT,
};
pub use service::{Activities, Companies, Contacts, Crm, Deals};

/// Every deal stage, in pipeline order
pub fn deal_stages() -> &'static [DealStage] {
    &DealStage::ALL
}

/// Every activity type
pub fn activity_types() -> &'static [ActivityType] {
    &ActivityType::ALL
}
