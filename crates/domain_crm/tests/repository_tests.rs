//! Tests for the generic record access contract, run against the in-memory store

use chrono::Duration;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use core_kernel::{ContactId, DealId, RecordKey};
use domain_crm::{ContactInput, CrmError, DealStage};
use test_utils::{
    assert_bulk_delete_accounts_for, assert_bulk_update_accounts_for, assert_contact_matches,
    assert_deal_matches, row, ContactInputBuilder, DealInputBuilder, InputFixtures,
    TemporalFixtures, TestCrm,
};

// ============================================================================
// Create / Get
// ============================================================================

mod create_and_get {
    use super::*;

    #[tokio::test]
    async fn test_create_then_get_returns_input_fields() {
        let t = TestCrm::new();
        let input = InputFixtures::contact();

        let created = t.contacts.create(&input).await.unwrap();
        let fetched = t.contacts.get_by_id(created.id).await.unwrap();

        assert_contact_matches(&fetched, &input);
        assert_eq!(fetched, created);
        assert_eq!(fetched.created_at, Some(TemporalFixtures::epoch()));
        assert_eq!(fetched.updated_at, Some(TemporalFixtures::epoch()));
    }

    #[tokio::test]
    async fn test_missing_optionals_are_sent_as_null() {
        let t = TestCrm::new();
        let input = InputFixtures::minimal_contact();

        let created = t.contacts.create(&input).await.unwrap();
        let stored = t.store.row("contact_c", created.id.value()).await.unwrap();

        assert_eq!(stored["phone_c"], Value::Null);
        assert_eq!(stored["companyId_c"], Value::Null);
        assert_eq!(stored["notes_c"], Value::Null);
        assert_contact_matches(&created, &input);
    }

    #[tokio::test]
    async fn test_numeric_strings_are_coerced() {
        let t = TestCrm::new();

        let deal = t
            .deals
            .create(&json!({
                "title": "Form-submitted deal",
                "value": "1500.25",
                "stage": "Lead",
                "probability": "35",
                "closeDate": "2024-07-01",
                "contactId": "",
                "companyId": 0
            }))
            .await
            .unwrap();

        assert_eq!(deal.value, Some(dec!(1500.25)));
        assert_eq!(deal.probability, 35);
        assert_eq!(deal.contact_id, None);
        assert_eq!(deal.company_id, None);

        let stored = t.store.row("deal_c", deal.id.value()).await.unwrap();
        assert_eq!(stored["probability_c"], json!(35));
        assert_eq!(stored["value_c"], json!(1500.25));
    }

    #[tokio::test]
    async fn test_deal_probability_defaults_to_zero() {
        let t = TestCrm::new();
        let input = DealInputBuilder::new().without_probability().build();

        let deal = t.deals.create(&input).await.unwrap();

        assert_deal_matches(&deal, &input);
        assert_eq!(deal.probability, 0);
    }

    #[tokio::test]
    async fn test_activity_completed_defaults_to_false() {
        let t = TestCrm::new();
        let activity = t.activities.create(&InputFixtures::activity()).await.unwrap();
        assert!(!activity.completed);
    }

    #[tokio::test]
    async fn test_missing_required_field_fails_before_store_call() {
        let t = TestCrm::new();

        let error = t
            .contacts
            .create(&json!({"firstName": "Ada"}))
            .await
            .unwrap_err();

        assert!(error.is_validation());
        assert_eq!(t.calls(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_probability_is_rejected() {
        let t = TestCrm::new();
        let input = DealInputBuilder::new().with_probability(120).build();

        let error = t.deals.create(&input).await.unwrap_err();

        assert!(matches!(error, CrmError::Validation { ref field, .. } if field.as_deref() == Some("probability_c")));
        assert_eq!(t.calls(), 0);
    }

    #[tokio::test]
    async fn test_store_rejection_surfaces_as_create_error() {
        let t = TestCrm::new();
        t.store.reject_when("email_c", "blocked@example.com", "Email address is blocked");

        let input = ContactInputBuilder::new().with_email("blocked@example.com").build();
        let error = t.contacts.create(&input).await.unwrap_err();

        match &error {
            CrmError::Create { message, failures, .. } => {
                assert_eq!(message, "Email address is blocked");
                assert_eq!(failures.len(), 1);
            }
            other => panic!("expected Create error, got {:?}", other),
        }
        assert_eq!(error.to_string(), "Failed to create Contact: Email address is blocked");
    }

    #[tokio::test]
    async fn test_get_missing_record_is_not_found() {
        let t = TestCrm::new();
        let error = t.contacts.get_by_id(ContactId::from_raw(404)).await.unwrap_err();
        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "Contact not found: 404");
    }

    #[tokio::test]
    async fn test_get_propagates_transport_failure() {
        let t = TestCrm::new();
        t.store.set_transport_failure(Some("connection reset"));

        let error = t.contacts.get_by_id(ContactId::from_raw(1)).await.unwrap_err();

        assert!(error.is_transport());
    }
}

// ============================================================================
// Update / Delete
// ============================================================================

mod update_and_delete {
    use super::*;

    #[tokio::test]
    async fn test_update_changes_only_patched_fields() {
        let t = TestCrm::new();
        let input = InputFixtures::contact();
        let created = t.contacts.create(&input).await.unwrap();

        let patch = ContactInput {
            title: Some("Head of Research".to_string()),
            ..Default::default()
        };
        t.contacts.update(created.id, &patch).await.unwrap();
        let fetched = t.contacts.get_by_id(created.id).await.unwrap();

        assert_eq!(fetched.title.as_deref(), Some("Head of Research"));
        assert_eq!(fetched.first_name, created.first_name);
        assert_eq!(fetched.email, created.email);
        assert_eq!(fetched.phone, created.phone);
        assert_eq!(fetched.notes, created.notes);
        assert_eq!(fetched.created_at, created.created_at);
        assert!(fetched.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn test_update_never_resends_created_at() {
        let t = TestCrm::new();
        let created = t.contacts.create(&InputFixtures::contact()).await.unwrap();
        t.advance(Duration::days(3));

        t.contacts
            .update(created.id, &json!({"createdAt_c": "2030-01-01T00:00:00.000Z", "phone": "555"}))
            .await
            .unwrap();
        let stored = t.store.row("contact_c", created.id.value()).await.unwrap();

        assert_eq!(stored["createdAt_c"], json!("2024-01-15T09:00:00.000Z"));
        assert_eq!(stored["phone_c"], json!("555"));
        assert_eq!(stored["updatedAt_c"], json!("2024-01-18T09:00:01.000Z"));
    }

    #[tokio::test]
    async fn test_update_without_updated_at_for_deals() {
        let t = TestCrm::new();
        let deal = t.deals.create(&InputFixtures::deal()).await.unwrap();

        t.deals.update(deal.id, &json!({"notes": "Legal review"})).await.unwrap();
        let stored = t.store.row("deal_c", deal.id.value()).await.unwrap();

        assert!(stored.get("updatedAt_c").is_none());
        assert_eq!(stored["notes_c"], json!("Legal review"));
    }

    #[tokio::test]
    async fn test_update_missing_record_is_update_error() {
        let t = TestCrm::new();

        let error = t
            .contacts
            .update(ContactId::from_raw(999), &json!({"title": "CTO"}))
            .await
            .unwrap_err();

        assert!(matches!(error, CrmError::Update { .. }));
        assert_eq!(error.failures()[0].id, Some(999));
    }

    #[tokio::test]
    async fn test_clearing_required_field_is_rejected() {
        let t = TestCrm::new();
        let created = t.contacts.create(&InputFixtures::contact()).await.unwrap();
        let calls = t.calls();

        let error = t.contacts.update(created.id, &json!({"email": null})).await.unwrap_err();

        assert!(error.is_validation());
        assert_eq!(t.calls(), calls);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let t = TestCrm::new();
        let created = t.companies.create(&InputFixtures::company()).await.unwrap();

        assert!(t.companies.delete(created.id).await.unwrap());
        let error = t.companies.get_by_id(created.id).await.unwrap_err();

        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_delete_error() {
        let t = TestCrm::new();
        let error = t.deals.delete(DealId::from_raw(77)).await.unwrap_err();
        assert!(matches!(error, CrmError::Delete { .. }));
    }

    #[tokio::test]
    async fn test_store_level_failure_on_delete() {
        let t = TestCrm::new();
        let created = t.contacts.create(&InputFixtures::contact()).await.unwrap();
        t.store.set_store_failure(Some("Table is read-only"));

        let error = t.contacts.delete(created.id).await.unwrap_err();

        assert_eq!(error.to_string(), "Failed to delete Contact: Table is read-only");
    }
}

// ============================================================================
// Degrading reads
// ============================================================================

mod degrading_reads {
    use super::*;

    #[tokio::test]
    async fn test_list_degrades_on_transport_failure() {
        let t = TestCrm::new();
        t.contacts.create(&InputFixtures::contact()).await.unwrap();
        t.store.set_transport_failure(Some("dns failure"));

        assert!(t.contacts.list().await.is_empty());
        assert!(t.contacts.search("ada").await.is_empty());
    }

    #[tokio::test]
    async fn test_list_degrades_on_store_failure() {
        let t = TestCrm::new();
        t.contacts.create(&InputFixtures::contact()).await.unwrap();
        t.store.set_store_failure(Some("quota exceeded"));

        assert!(t.contacts.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_rows_are_skipped() {
        let t = TestCrm::new();
        t.deals.create(&InputFixtures::deal()).await.unwrap();
        t.store
            .seed("deal_c", vec![row(json!({"title_c": "Legacy", "stage_c": "Archived"}))])
            .await;

        let deals = t.deals.list().await;

        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].stage, DealStage::Proposal);
    }

    #[tokio::test]
    async fn test_search_matches_any_field_case_insensitively() {
        let t = TestCrm::new();
        t.contacts.create(&InputFixtures::contact()).await.unwrap();
        t.contacts.create(&InputFixtures::minimal_contact()).await.unwrap();

        let by_name = t.contacts.search("ADA").await;
        let by_title = t.contacts.search("analyst").await;
        let by_email = t.contacts.search("navy").await;

        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].first_name, "Ada");
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_email[0].first_name, "Grace");
    }

    #[tokio::test]
    async fn test_blank_search_lists_everything() {
        let t = TestCrm::new();
        t.contacts.create(&InputFixtures::contact()).await.unwrap();
        t.contacts.create(&InputFixtures::minimal_contact()).await.unwrap();

        assert_eq!(t.contacts.search("   ").await.len(), 2);
    }

    #[tokio::test]
    async fn test_company_search_covers_industry_and_size() {
        let t = TestCrm::new();
        t.companies.create(&InputFixtures::company()).await.unwrap();

        assert_eq!(t.companies.search("techno").await.len(), 1);
        assert_eq!(t.companies.search("51-200").await.len(), 1);
        assert!(t.companies.search("retail").await.is_empty());
    }
}

// ============================================================================
// Bulk operations
// ============================================================================

mod bulk {
    use super::*;

    async fn three_contacts(t: &TestCrm) -> Vec<ContactId> {
        let mut ids = Vec::new();
        for _ in 0..3 {
            let contact = t.contacts.create(&ContactInputBuilder::random().build()).await.unwrap();
            ids.push(contact.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_bulk_update_reports_missing_id() {
        let t = TestCrm::new();
        let mut ids = three_contacts(&t).await;
        ids.push(ContactId::from_raw(999));

        let outcome = t
            .contacts
            .bulk_update(&ids, &json!({"title": "Customer Advisory Board"}))
            .await;

        assert_bulk_update_accounts_for(&outcome, ids.len());
        assert_eq!(outcome.success_count, 3);
        assert_eq!(outcome.error_count, 1);
        assert!(outcome.errors.iter().any(|e| e.covers(999)));
        assert!(outcome
            .updated
            .iter()
            .all(|c| c.title.as_deref() == Some("Customer Advisory Board")));
    }

    #[tokio::test]
    async fn test_bulk_update_is_one_batched_call() {
        let t = TestCrm::new();
        let ids = three_contacts(&t).await;
        let calls = t.calls();

        t.contacts.bulk_update(&ids, &json!({"notes": "Q3 campaign"})).await;

        assert_eq!(t.calls(), calls + 1);
    }

    #[tokio::test]
    async fn test_bulk_update_transport_failure_is_aggregate() {
        let t = TestCrm::new();
        let ids = three_contacts(&t).await;
        t.store.set_transport_failure(Some("timeout"));

        let outcome = t.contacts.bulk_update(&ids, &json!({"title": "VP"})).await;

        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.error_count, 3);
        assert_eq!(outcome.errors.len(), 1);
        assert!(ids.iter().all(|id| outcome.errors[0].covers(id.raw())));
    }

    #[tokio::test]
    async fn test_bulk_update_invalid_patch_makes_no_call() {
        let t = TestCrm::new();
        let ids = three_contacts(&t).await;
        let calls = t.calls();

        let outcome = t.contacts.bulk_update(&ids, &json!({"lastName": null})).await;

        assert_eq!(outcome.error_count, 3);
        assert_eq!(t.calls(), calls);
    }

    #[tokio::test]
    async fn test_bulk_update_partial_rejection() {
        let t = TestCrm::new();
        let ids = three_contacts(&t).await;
        t.store.reject_when("Id", ids[1].raw(), "Record is locked");

        let outcome = t.contacts.bulk_update(&ids, &json!({"title": "Director"})).await;

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].ids, vec![ids[1].raw()]);
        assert_eq!(outcome.errors[0].error, "Record is locked");
    }

    #[tokio::test]
    async fn test_bulk_delete_partitions_outcomes() {
        let t = TestCrm::new();
        let mut ids = three_contacts(&t).await;
        ids.push(ContactId::from_raw(4242));

        let outcome = t.contacts.bulk_delete(&ids).await;

        assert_bulk_delete_accounts_for(&outcome, ids.len());
        assert_eq!(outcome.deleted, ids[..3].to_vec());
        assert_eq!(outcome.failed_ids().collect::<Vec<_>>(), vec![4242]);
        assert_eq!(t.store.len("contact_c").await, 0);
    }

    #[tokio::test]
    async fn test_bulk_delete_store_failure_is_aggregate() {
        let t = TestCrm::new();
        let ids = three_contacts(&t).await;
        t.store.set_store_failure(Some("maintenance window"));

        let outcome = t.contacts.bulk_delete(&ids).await;

        assert_eq!(outcome.error_count, ids.len());
        assert_eq!(outcome.errors[0].error, "maintenance window");
        assert!(outcome.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_empty_bulk_request_makes_no_call() {
        let t = TestCrm::new();
        let outcome = t.contacts.bulk_delete(&[]).await;
        assert_eq!(outcome.success_count + outcome.error_count, 0);
        assert_eq!(t.calls(), 0);
    }
}

// ============================================================================
// Stores that answer without per-record results
// ============================================================================

mod terse_store {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;

    use core_kernel::{AdapterHealth, CompanyId, DomainPort, HealthCheckResult, HealthCheckable, PortError};
    use domain_crm::wire::{DeletePayload, MutationPayload, Query, RecordResult, StoreResponse};
    use domain_crm::{Company, EntityRepository, RecordStore};

    /// Echoes created rows in `data` and confirms deletes for one fixed id
    #[derive(Debug)]
    struct TerseStore {
        assigned_id: i64,
        confirmed_delete: i64,
    }

    impl DomainPort for TerseStore {}

    #[async_trait]
    impl HealthCheckable for TerseStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "terse-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: None,
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl RecordStore for TerseStore {
        async fn fetch_records(&self, _table: &str, _query: &Query) -> Result<StoreResponse, PortError> {
            Ok(StoreResponse::ok(json!([])))
        }

        async fn get_record_by_id(
            &self,
            _table: &str,
            id: i64,
            _query: &Query,
        ) -> Result<StoreResponse, PortError> {
            Ok(StoreResponse::failure(format!("Record with Id {} does not exist", id)))
        }

        async fn create_record(
            &self,
            _table: &str,
            payload: &MutationPayload,
        ) -> Result<StoreResponse, PortError> {
            let mut row = payload.records[0].clone();
            row.insert("Id".to_string(), json!(self.assigned_id));
            Ok(StoreResponse::ok(Value::Object(row)))
        }

        async fn update_record(
            &self,
            _table: &str,
            _payload: &MutationPayload,
        ) -> Result<StoreResponse, PortError> {
            Ok(StoreResponse::failure("Table is read-only"))
        }

        async fn delete_record(
            &self,
            _table: &str,
            _payload: &DeletePayload,
        ) -> Result<StoreResponse, PortError> {
            Ok(StoreResponse::with_results(vec![RecordResult {
                success: true,
                data: None,
                message: None,
                id: Some(self.confirmed_delete),
            }]))
        }
    }

    fn companies(assigned_id: i64, confirmed_delete: i64) -> EntityRepository<Company> {
        EntityRepository::new(Arc::new(TerseStore {
            assigned_id,
            confirmed_delete,
        }))
    }

    #[tokio::test]
    async fn test_create_accepts_row_echoed_in_data() {
        let repo = companies(31, 31);
        let input = InputFixtures::company();

        let created = repo.create(&input).await.unwrap();

        assert_eq!(created.id, CompanyId::from_raw(31));
        assert_eq!(Some(created.name), input.name);
    }

    #[tokio::test]
    async fn test_delete_needs_a_result_for_the_requested_id() {
        let repo = companies(1, 77);

        let error = repo.delete(CompanyId::from_raw(5)).await.unwrap_err();

        assert!(matches!(error, CrmError::Delete { .. }));
        assert_eq!(error.failures()[0].id, Some(5));
    }

    #[tokio::test]
    async fn test_delete_confirmed_for_the_requested_id() {
        let repo = companies(1, 5);
        assert!(repo.delete(CompanyId::from_raw(5)).await.unwrap());
    }
}
