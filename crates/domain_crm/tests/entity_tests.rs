//! Tests for the entity-specific queries: deal pipeline, activity schedule,
//! contact export, and relationship lookups

use chrono::Duration;
use proptest::prelude::*;
use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::{AdapterHealth, ContactId, RecordKey};
use domain_crm::{deal_stages, DealStage, DEFAULT_UPCOMING_LIMIT};
use test_utils::{
    assert_contact_matches, assert_deal_matches, assert_sorted_by_due_date, contact_input_strategy,
    deal_input_strategy, invalid_probability_strategy, row, ActivityInputBuilder, ContactInputBuilder,
    DealInputBuilder, InputFixtures, TemporalFixtures, TestCrm,
};

// ============================================================================
// Deals
// ============================================================================

mod deal_pipeline {
    use super::*;

    #[tokio::test]
    async fn test_closed_won_forces_full_probability() {
        let t = TestCrm::new();
        let deal = t.deals.create(&InputFixtures::deal()).await.unwrap();

        let won = t.deals.update_stage(deal.id, "Closed Won").await.unwrap();

        assert_eq!(won.stage, DealStage::ClosedWon);
        assert_eq!(won.probability, 100);
    }

    #[tokio::test]
    async fn test_closed_lost_forces_zero_probability() {
        let t = TestCrm::new();
        let deal = t.deals.create(&InputFixtures::deal()).await.unwrap();

        let lost = t.deals.update_stage(deal.id, "Closed Lost").await.unwrap();

        assert_eq!(lost.stage, DealStage::ClosedLost);
        assert_eq!(lost.probability, 0);
    }

    #[tokio::test]
    async fn test_open_stage_keeps_probability() {
        let t = TestCrm::new();
        let deal = t.deals.create(&InputFixtures::deal()).await.unwrap();

        let moved = t.deals.update_stage(deal.id, "Negotiation").await.unwrap();

        assert_eq!(moved.stage, DealStage::Negotiation);
        assert_eq!(moved.probability, 40);
        assert_eq!(moved.value, deal.value);
    }

    #[tokio::test]
    async fn test_unknown_stage_makes_no_call() {
        let t = TestCrm::new();
        let deal = t.deals.create(&InputFixtures::deal()).await.unwrap();
        let calls = t.calls();

        let error = t.deals.update_stage(deal.id, "Pending").await.unwrap_err();

        assert!(error.is_validation());
        assert!(error.to_string().contains("Closed Won"));
        assert_eq!(t.calls(), calls);
        assert_eq!(t.deals.get_by_id(deal.id).await.unwrap().stage, DealStage::Proposal);
    }

    #[tokio::test]
    async fn test_by_stage_partitions_every_deal() {
        let t = TestCrm::new();
        for stage in [DealStage::Lead, DealStage::Proposal, DealStage::Proposal, DealStage::ClosedWon] {
            t.deals
                .create(&DealInputBuilder::new().with_stage(stage).build())
                .await
                .unwrap();
        }

        let grouped = t.deals.by_stage().await;
        let all = t.deals.list().await;

        assert_eq!(grouped.len(), 6);
        assert_eq!(grouped.values().map(Vec::len).sum::<usize>(), all.len());
        assert_eq!(grouped[&DealStage::Proposal].len(), 2);
        assert!(grouped[&DealStage::Negotiation].is_empty());
        for (stage, deals) in &grouped {
            assert!(deals.iter().all(|d| d.stage == *stage));
        }
    }

    #[tokio::test]
    async fn test_by_stage_is_complete_when_store_is_down() {
        let t = TestCrm::new();
        t.store.set_transport_failure(Some("unreachable"));

        let grouped = t.deals.by_stage().await;

        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), deal_stages().to_vec());
        assert!(grouped.values().all(Vec::is_empty));
    }

    #[tokio::test]
    async fn test_pipeline_summary_totals() {
        let t = TestCrm::new();
        t.deals.create(&InputFixtures::deal()).await.unwrap();
        t.deals.create(&DealInputBuilder::new().small().build()).await.unwrap();
        t.deals
            .create(&DealInputBuilder::new().with_stage(DealStage::Lead).small().build())
            .await
            .unwrap();

        let summary = t.deals.pipeline_summary().await;
        let proposal = summary.iter().find(|s| s.stage == DealStage::Proposal).unwrap();

        assert_eq!(summary.len(), 6);
        assert_eq!(proposal.count, 2);
        assert_eq!(proposal.total_value, dec!(26200.50));
        assert_eq!(proposal.weighted_value, dec!(10480.20));
    }

    #[tokio::test]
    async fn test_deals_by_contact_and_company() {
        let t = TestCrm::new();
        let company = t.companies.create(&InputFixtures::company()).await.unwrap();
        let contact = t
            .contacts
            .create(&ContactInputBuilder::new().with_company(company.id).build())
            .await
            .unwrap();
        t.deals
            .create(&DealInputBuilder::new().with_contact(contact.id).with_company(company.id).build())
            .await
            .unwrap();
        t.deals.create(&DealInputBuilder::new().with_company(company.id).build()).await.unwrap();
        t.deals.create(&InputFixtures::deal()).await.unwrap();

        assert_eq!(t.deals.by_contact(contact.id).await.len(), 1);
        assert_eq!(t.deals.by_company(company.id).await.len(), 2);
        assert_eq!(t.contacts.by_company(company.id).await.len(), 1);
    }
}

// ============================================================================
// Activities
// ============================================================================

mod activity_schedule {
    use super::*;

    async fn schedule(t: &TestCrm) {
        for hours in [3, 1, 2] {
            t.activities
                .create(&ActivityInputBuilder::new().due_in_hours(hours).build())
                .await
                .unwrap();
        }
        t.activities
            .create(
                &ActivityInputBuilder::new()
                    .due_at(TemporalFixtures::epoch() + Duration::minutes(30))
                    .completed(true)
                    .build(),
            )
            .await
            .unwrap();
        t.activities
            .create(&ActivityInputBuilder::new().due_in_hours(-2).build())
            .await
            .unwrap();
        t.activities
            .create(&ActivityInputBuilder::new().due_in_hours(-5).completed(true).build())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upcoming_returns_earliest_open_activities() {
        let t = TestCrm::new();
        schedule(&t).await;

        let upcoming = t.activities.upcoming(2).await;

        assert_eq!(upcoming.len(), 2);
        assert_sorted_by_due_date(&upcoming);
        assert_eq!(upcoming[0].due_date, Some(TemporalFixtures::hours_after_epoch(1)));
        assert_eq!(upcoming[1].due_date, Some(TemporalFixtures::hours_after_epoch(2)));
    }

    #[tokio::test]
    async fn test_upcoming_default_limit_covers_all_open_future() {
        let t = TestCrm::new();
        schedule(&t).await;

        let upcoming = t.activities.upcoming(DEFAULT_UPCOMING_LIMIT).await;

        assert_eq!(upcoming.len(), 3);
        assert!(upcoming.iter().all(|a| !a.completed));
        assert_sorted_by_due_date(&upcoming);
    }

    #[tokio::test]
    async fn test_overdue_excludes_completed() {
        let t = TestCrm::new();
        schedule(&t).await;

        let overdue = t.activities.overdue().await;

        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].due_date, Some(TemporalFixtures::hours_before_epoch(2)));
        assert!(overdue[0].is_overdue(t.clock.peek()));
    }

    #[tokio::test]
    async fn test_overdue_grows_as_time_passes() {
        let t = TestCrm::new();
        schedule(&t).await;
        t.advance(Duration::minutes(90));

        assert_eq!(t.activities.overdue().await.len(), 2);
        assert_eq!(t.activities.upcoming(DEFAULT_UPCOMING_LIMIT).await.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_completed_only_touches_completed() {
        let t = TestCrm::new();
        let activity = t
            .activities
            .create(&ActivityInputBuilder::new().due_in_hours(1).build())
            .await
            .unwrap();

        let done = t.activities.mark_completed(activity.id).await.unwrap();

        assert!(done.completed);
        assert_eq!(done.subject, activity.subject);
        assert_eq!(done.due_date, activity.due_date);
        assert_eq!(done.created_at, activity.created_at);
        assert!(t.activities.upcoming(DEFAULT_UPCOMING_LIMIT).await.is_empty());
    }

    #[tokio::test]
    async fn test_activities_by_contact_and_deal() {
        let t = TestCrm::new();
        let contact = t.contacts.create(&InputFixtures::contact()).await.unwrap();
        let deal = t.deals.create(&InputFixtures::deal()).await.unwrap();
        t.activities
            .create(&ActivityInputBuilder::new().for_contact(contact.id).build())
            .await
            .unwrap();
        t.activities
            .create(&ActivityInputBuilder::new().for_contact(contact.id).for_deal(deal.id).build())
            .await
            .unwrap();
        t.activities.create(&InputFixtures::activity()).await.unwrap();

        assert_eq!(t.activities.by_contact(contact.id).await.len(), 2);
        assert_eq!(t.activities.by_deal(deal.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_references_match_by_id() {
        let t = TestCrm::new();
        t.store
            .seed(
                "activity_c",
                vec![row(json!({
                    "type_c": "Email",
                    "subject_c": "Proposal sent",
                    "contactId_c": {"Id": 12, "Name": "Ada Lovelace"},
                    "dueDate_c": "2024-01-20T10:00:00.000Z",
                    "completed_c": false
                }))],
            )
            .await;

        let found = t.activities.by_contact(ContactId::from_raw(12)).await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].contact_id.as_ref().and_then(|r| r.name()), Some("Ada Lovelace"));
    }
}

// ============================================================================
// Contacts export
// ============================================================================

mod contact_export {
    use super::*;

    const HEADER: &str = "ID,First Name,Last Name,Email,Phone,Title,Company,Created At,Updated At";

    #[tokio::test]
    async fn test_export_quotes_text_and_keeps_full_timestamps() {
        let t = TestCrm::new();
        t.contacts.create(&InputFixtures::contact()).await.unwrap();
        t.store
            .seed(
                "contact_c",
                vec![row(json!({
                    "Id": 50,
                    "firstName_c": "Lin",
                    "lastName_c": "Chen",
                    "email_c": "lin@acme.example",
                    "companyId_c": {"Id": 7, "Name": "Acme Corp"},
                    "createdAt_c": "2024-02-01T10:00:00.000Z",
                    "updatedAt_c": "2024-02-02T11:30:00.000Z"
                }))],
            )
            .await;

        let contacts = t.contacts.list().await;
        let export = t.contacts.export_csv(&contacts).unwrap();
        let lines: Vec<&str> = export.content.lines().collect();

        assert_eq!(export.filename, "contacts_export_2024-01-15.csv");
        assert_eq!(export.count, 2);
        assert_eq!(lines[0], HEADER);
        assert_eq!(
            lines[1],
            r#"1,"Ada","Lovelace","ada.lovelace@analytical.example","+44 20 7946 0018","Chief Analyst","","2024-01-15T09:00:00.000Z","2024-01-15T09:00:00.000Z""#
        );
        assert_eq!(
            lines[2],
            r#"50,"Lin","Chen","lin@acme.example","","","Acme Corp","2024-02-01T10:00:00.000Z","2024-02-02T11:30:00.000Z""#
        );
    }

    #[tokio::test]
    async fn test_export_escapes_embedded_quotes() {
        let t = TestCrm::new();
        t.contacts
            .create(&ContactInputBuilder::new().with_title("Head of \"Special\" Projects").build())
            .await
            .unwrap();

        let export = t.contacts.export_csv(&t.contacts.list().await).unwrap();

        assert!(export.content.contains(r#""Head of ""Special"" Projects""#));
    }

    #[tokio::test]
    async fn test_export_of_nothing_is_header_only() {
        let t = TestCrm::new();
        let export = t.contacts.export_csv(&[]).unwrap();
        assert_eq!(export.content.trim_end(), HEADER);
        assert_eq!(export.count, 0);
    }
}

// ============================================================================
// Health
// ============================================================================

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_follows_store_reachability() {
        let t = TestCrm::new();
        assert_eq!(t.health().await.status, AdapterHealth::Healthy);

        t.store.set_transport_failure(Some("connection refused"));
        let health = t.health().await;

        assert_eq!(health.status, AdapterHealth::Unhealthy);
        assert!(!health.is_operational());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn contact_create_then_get_preserves_fields(input in contact_input_strategy()) {
            block_on(async {
                let t = TestCrm::new();
                let created = t.contacts.create(&input).await.unwrap();
                let fetched = t.contacts.get_by_id(created.id).await.unwrap();
                assert_contact_matches(&fetched, &input);
            });
        }

        #[test]
        fn deal_create_then_get_preserves_fields(input in deal_input_strategy()) {
            block_on(async {
                let t = TestCrm::new();
                let created = t.deals.create(&input).await.unwrap();
                let fetched = t.deals.get_by_id(created.id).await.unwrap();
                assert_deal_matches(&fetched, &input);
            });
        }

        #[test]
        fn out_of_range_probability_never_reaches_store(probability in invalid_probability_strategy()) {
            block_on(async {
                let t = TestCrm::new();
                let input = DealInputBuilder::new().with_probability(probability).build();
                let error = t.deals.create(&input).await.unwrap_err();
                assert!(error.is_validation());
                assert_eq!(t.calls(), 0);
            });
        }

        #[test]
        fn bulk_delete_accounts_for_every_id(existing in 0usize..6, missing in 0usize..4) {
            block_on(async {
                let t = TestCrm::new();
                let mut ids = Vec::new();
                for _ in 0..existing {
                    ids.push(t.contacts.create(&ContactInputBuilder::random().build()).await.unwrap().id);
                }
                ids.extend((0..missing).map(|n| ContactId::from_raw(10_000 + n as i64)));

                let outcome = t.contacts.bulk_delete(&ids).await;

                assert_eq!(outcome.success_count, existing);
                assert_eq!(outcome.error_count, missing);
                assert!(outcome.deleted.iter().all(|id| id.raw() < 10_000));
            });
        }
    }
}
