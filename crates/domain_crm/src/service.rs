//! The CRM facade: one repository per entity over a shared store

use std::fmt;
use std::sync::Arc;

use core_kernel::{Clock, HealthCheckResult, SystemClock};

use crate::entities::{Activity, Company, Contact, Deal};
use crate::ports::RecordStore;
use crate::repository::EntityRepository;

pub type Contacts = EntityRepository<Contact>;
pub type Companies = EntityRepository<Company>;
pub type Deals = EntityRepository<Deal>;
pub type Activities = EntityRepository<Activity>;

/// Entry point to the CRM records
#[derive(Clone)]
pub struct Crm {
    pub contacts: Contacts,
    pub companies: Companies,
    pub deals: Deals,
    pub activities: Activities,
    store: Arc<dyn RecordStore>,
}

impl Crm {
    /// Builds the facade over `store` using wall-clock time
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Builds the facade with an explicit clock shared by every repository
    pub fn with_clock(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            contacts: EntityRepository::with_clock(Arc::clone(&store), Arc::clone(&clock)),
            companies: EntityRepository::with_clock(Arc::clone(&store), Arc::clone(&clock)),
            deals: EntityRepository::with_clock(Arc::clone(&store), Arc::clone(&clock)),
            activities: EntityRepository::with_clock(Arc::clone(&store), clock),
            store,
        }
    }

    /// Health of the underlying store
    pub async fn health(&self) -> HealthCheckResult {
        self.store.health_check().await
    }
}

impl fmt::Debug for Crm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crm")
            .field("contacts", &self.contacts)
            .field("companies", &self.companies)
            .field("deals", &self.deals)
            .field("activities", &self.activities)
            .finish_non_exhaustive()
    }
}
