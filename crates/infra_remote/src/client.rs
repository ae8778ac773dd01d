//! HTTP Record Store Adapter
//!
//! `HttpRecordStore` implements the `RecordStore` port against the hosted
//! record store's REST API.
//!
//! # Endpoints
//!
//! | Port call | Request |
//! |---|---|
//! | `fetch_records` | `POST {base}/tables/{table}/records/query` |
//! | `get_record_by_id` | `POST {base}/tables/{table}/records/{id}/query` |
//! | `create_record` | `POST {base}/tables/{table}/records` |
//! | `update_record` | `PATCH {base}/tables/{table}/records` |
//! | `delete_record` | `DELETE {base}/tables/{table}/records` |
//!
//! Every request carries `X-Project-Id` and a bearer `Authorization` header.
//!
//! # Error Handling
//!
//! A response whose body is a store envelope is returned as-is, whatever its
//! status, so the domain sees the store's own message. Anything else maps to
//! `PortError`:
//! - 404 -> `PortError::NotFound`
//! - 401/403 -> `PortError::Unauthorized`
//! - 429 -> `PortError::RateLimited`
//! - 5xx -> `PortError::ServiceUnavailable`
//! - Timeouts -> `PortError::Timeout`
//! - Connect failures -> `PortError::Connection`
//! - Unreadable 2xx bodies -> `PortError::Transformation`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_crm::wire::{DeletePayload, MutationPayload, Query, StoreResponse};
use domain_crm::RecordStore;

use crate::config::ClientConfig;
use crate::error::RemoteError;

/// Header naming the project the tables belong to
pub const PROJECT_HEADER: &str = "X-Project-Id";

const ADAPTER_ID: &str = "http-record-store";
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// `RecordStore` over the hosted store's REST API
#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    client: Client,
    config: ClientConfig,
}

impl HttpRecordStore {
    /// Builds the adapter and its connection pool
    pub fn new(config: ClientConfig) -> Result<Self, RemoteError> {
        let config = config.validated()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("open-crm-core/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Builds the adapter from `CRM_STORE_*` environment variables
    pub fn from_env() -> Result<Self, RemoteError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn records_url(&self, table: &str) -> String {
        format!("{}/tables/{}/records", self.config.base_url, table)
    }

    fn query_url(&self, table: &str) -> String {
        format!("{}/query", self.records_url(table))
    }

    fn record_query_url(&self, table: &str, id: i64) -> String {
        format!("{}/{}/query", self.records_url(table), id)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        method: Method,
        url: String,
        body: &B,
    ) -> Result<StoreResponse, PortError> {
        let started = Instant::now();
        let response = self
            .client
            .request(method, &url)
            .header(PROJECT_HEADER, &self.config.project_id)
            .bearer_auth(&self.config.public_key)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(operation, self.config.timeout(), e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(operation, self.config.timeout(), e))?;

        debug!(
            operation,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Record store responded"
        );

        let envelope = interpret(status, retry_after, &body, &url)?;
        if !envelope.success {
            warn!(operation, message = ?envelope.message, "Record store reported failure");
        }
        Ok(envelope)
    }
}

impl DomainPort for HttpRecordStore {}

#[async_trait]
impl HealthCheckable for HttpRecordStore {
    /// Probes the store root
    ///
    /// Any HTTP answer below 500 counts as reachable; a 5xx is degraded.
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = self
            .client
            .get(&self.config.base_url)
            .header(PROJECT_HEADER, &self.config.project_id)
            .bearer_auth(&self.config.public_key)
            .send()
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(response) if response.status().is_server_error() => (
                AdapterHealth::Degraded,
                Some(format!("Record store returned {}", response.status())),
            ),
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Record store unreachable: {}", e))),
        };

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    #[instrument(skip(self, query))]
    async fn fetch_records(&self, table: &str, query: &Query) -> Result<StoreResponse, PortError> {
        self.send("fetch_records", Method::POST, self.query_url(table), query)
            .await
    }

    #[instrument(skip(self, query))]
    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        query: &Query,
    ) -> Result<StoreResponse, PortError> {
        self.send("get_record_by_id", Method::POST, self.record_query_url(table, id), query)
            .await
    }

    #[instrument(skip(self, payload), fields(count = payload.records.len()))]
    async fn create_record(
        &self,
        table: &str,
        payload: &MutationPayload,
    ) -> Result<StoreResponse, PortError> {
        self.send("create_record", Method::POST, self.records_url(table), payload)
            .await
    }

    #[instrument(skip(self, payload), fields(count = payload.records.len()))]
    async fn update_record(
        &self,
        table: &str,
        payload: &MutationPayload,
    ) -> Result<StoreResponse, PortError> {
        self.send("update_record", Method::PATCH, self.records_url(table), payload)
            .await
    }

    #[instrument(skip(self, payload), fields(count = payload.record_ids.len()))]
    async fn delete_record(
        &self,
        table: &str,
        payload: &DeletePayload,
    ) -> Result<StoreResponse, PortError> {
        self.send("delete_record", Method::DELETE, self.records_url(table), payload)
            .await
    }
}

/// Turns a raw HTTP answer into a store envelope or a port error
pub(crate) fn interpret(
    status: StatusCode,
    retry_after: Option<u64>,
    body: &[u8],
    url: &str,
) -> Result<StoreResponse, PortError> {
    let parsed = serde_json::from_slice::<StoreResponse>(body);
    if let Ok(envelope) = parsed {
        return Ok(envelope);
    }

    if status.is_success() {
        return Err(PortError::transformation(format!(
            "Unreadable record store response from {}: {}",
            url,
            snippet(body)
        )));
    }

    Err(match status {
        StatusCode::NOT_FOUND => PortError::not_found("resource", url),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized {
            message: format!("Record store refused credentials ({})", status),
        },
        StatusCode::TOO_MANY_REQUESTS => PortError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        s if s.is_server_error() => PortError::ServiceUnavailable {
            service: format!("record store ({})", s),
        },
        s => PortError::internal(format!("Unexpected record store status {}: {}", s, snippet(body))),
    })
}

fn transport_error(operation: &str, timeout: Duration, error: reqwest::Error) -> PortError {
    if error.is_timeout() {
        PortError::Timeout {
            operation: operation.to_string(),
            duration_ms: timeout.as_millis() as u64,
        }
    } else if error.is_connect() {
        PortError::Connection {
            message: format!("{}: cannot reach record store", operation),
            source: Some(Box::new(error)),
        }
    } else {
        PortError::Internal {
            message: format!("{} failed", operation),
            source: Some(Box::new(error)),
        }
    }
}

fn snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(body).chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> HttpRecordStore {
        HttpRecordStore::new(ClientConfig::new("https://store.test/api/", "proj", "pk")).unwrap()
    }

    #[test]
    fn test_urls() {
        let store = store();
        assert_eq!(store.records_url("deal_c"), "https://store.test/api/tables/deal_c/records");
        assert_eq!(store.query_url("deal_c"), "https://store.test/api/tables/deal_c/records/query");
        assert_eq!(
            store.record_query_url("deal_c", 42),
            "https://store.test/api/tables/deal_c/records/42/query"
        );
    }

    #[test]
    fn test_envelope_passes_through_regardless_of_status() {
        let body = json!({"success": false, "message": "Invalid filter"}).to_string();
        let envelope = interpret(StatusCode::BAD_REQUEST, None, body.as_bytes(), "u").unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Invalid filter"));
    }

    #[test]
    fn test_unreadable_success_is_transformation_error() {
        let error = interpret(StatusCode::OK, None, b"<html>", "u").unwrap_err();
        assert!(matches!(error, PortError::Transformation { .. }));
    }

    #[test]
    fn test_status_mapping() {
        assert!(interpret(StatusCode::NOT_FOUND, None, b"", "u").unwrap_err().is_not_found());
        assert!(matches!(
            interpret(StatusCode::FORBIDDEN, None, b"", "u").unwrap_err(),
            PortError::Unauthorized { .. }
        ));
        assert!(matches!(
            interpret(StatusCode::TOO_MANY_REQUESTS, Some(9), b"", "u").unwrap_err(),
            PortError::RateLimited { retry_after_secs: 9 }
        ));
        assert!(matches!(
            interpret(StatusCode::TOO_MANY_REQUESTS, None, b"", "u").unwrap_err(),
            PortError::RateLimited { retry_after_secs: DEFAULT_RETRY_AFTER_SECS }
        ));
        let unavailable = interpret(StatusCode::BAD_GATEWAY, None, b"upstream", "u").unwrap_err();
        assert!(unavailable.is_transient());
        assert!(matches!(
            interpret(StatusCode::CONFLICT, None, b"", "u").unwrap_err(),
            PortError::Internal { .. }
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let error = HttpRecordStore::new(ClientConfig::new("ftp://store.test", "proj", "pk")).unwrap_err();
        assert!(error.is_config_error());
    }
}
