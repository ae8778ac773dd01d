//! Shared store handle
//!
//! `remote_store()` hands out one process-wide `HttpRecordStore` built from
//! the environment on first use, so every repository shares one connection
//! pool.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use domain_crm::RecordStore;

use crate::client::HttpRecordStore;
use crate::error::RemoteError;

static REMOTE_STORE: OnceCell<Arc<HttpRecordStore>> = OnceCell::new();

/// The process-wide record store client
///
/// The first call reads `CRM_STORE_*` configuration; a failed first call
/// leaves the handle uninitialized so a later call can retry.
pub fn remote_store() -> Result<Arc<dyn RecordStore>, RemoteError> {
    let store = REMOTE_STORE.get_or_try_init(|| {
        let store = HttpRecordStore::from_env()?;
        info!(base_url = %store.config().base_url, "Record store client initialized");
        Ok::<_, RemoteError>(Arc::new(store))
    })?;
    Ok(Arc::clone(store) as Arc<dyn RecordStore>)
}
