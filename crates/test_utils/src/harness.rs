//! In-memory CRM Harness
//!
//! Wires an `InMemoryRecordStore` and a `ManualClock` into a `Crm`, so a
//! test can drive the full access layer and then inspect or sabotage the
//! store underneath it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use core_kernel::{Clock, ManualClock};
use domain_crm::{Crm, InMemoryRecordStore, RecordStore};

use crate::fixtures::TemporalFixtures;

/// A `Crm` over an in-memory store with a controllable clock
pub struct TestCrm {
    pub crm: Crm,
    pub store: Arc<InMemoryRecordStore>,
    pub clock: Arc<ManualClock>,
}

impl Default for TestCrm {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCrm {
    /// Starts at the fixture epoch; the clock ticks one second per read
    pub fn new() -> Self {
        Self::starting_at(TemporalFixtures::epoch())
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        let store = Arc::new(InMemoryRecordStore::new());
        let clock = Arc::new(ManualClock::new(start));
        let crm = Crm::with_clock(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        Self { crm, store, clock }
    }

    /// Moves the clock forward
    pub fn advance(&self, by: Duration) {
        self.clock.set(self.clock.peek() + by);
    }

    /// Store calls made so far
    pub fn calls(&self) -> usize {
        self.store.call_count()
    }
}

impl std::ops::Deref for TestCrm {
    type Target = Crm;

    fn deref(&self) -> &Crm {
        &self.crm
    }
}
