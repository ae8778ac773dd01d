//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the CRM entities. These fixtures are
//! consistent and predictable so unit tests can compare exact values.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use domain_crm::wire::RawRecord;
use domain_crm::{ActivityInput, ActivityType, CompanyInput, ContactInput, DealInput, DealStage};

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Instant every test clock starts at (Jan 15, 2024 09:00 UTC)
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
    }

    /// `hours` after the epoch
    pub fn hours_after_epoch(hours: i64) -> DateTime<Utc> {
        Self::epoch() + Duration::hours(hours)
    }

    /// `hours` before the epoch
    pub fn hours_before_epoch(hours: i64) -> DateTime<Utc> {
        Self::epoch() - Duration::hours(hours)
    }

    /// Standard deal close date
    pub fn close_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }
}

/// Fixture for decimal test data
pub struct DecimalFixtures;

impl DecimalFixtures {
    /// Standard deal value
    pub fn deal_value() -> Decimal {
        dec!(25000.50)
    }

    /// Small deal value
    pub fn small_deal_value() -> Decimal {
        dec!(1200)
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn email() -> &'static str {
        "ada.lovelace@analytical.example"
    }

    pub fn company_name() -> &'static str {
        "Analytical Engines Ltd"
    }

    pub fn industry() -> &'static str {
        "Technology"
    }

    pub fn company_size() -> &'static str {
        "51-200"
    }
}

/// Fixture for complete entity inputs
pub struct InputFixtures;

impl InputFixtures {
    /// A contact with every field filled except the company link
    pub fn contact() -> ContactInput {
        ContactInput {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some(StringFixtures::email().to_string()),
            phone: Some("+44 20 7946 0018".to_string()),
            company_id: None,
            title: Some("Chief Analyst".to_string()),
            notes: Some("Met at the engine demo".to_string()),
        }
    }

    /// A contact with only the required fields
    pub fn minimal_contact() -> ContactInput {
        ContactInput {
            first_name: Some("Grace".to_string()),
            last_name: Some("Hopper".to_string()),
            email: Some("grace@navy.example".to_string()),
            ..Default::default()
        }
    }

    pub fn company() -> CompanyInput {
        CompanyInput {
            name: Some(StringFixtures::company_name().to_string()),
            industry: Some(StringFixtures::industry().to_string()),
            size: Some(StringFixtures::company_size().to_string()),
            website: Some("https://analytical.example".to_string()),
            address: Some("12 St James's Square, London".to_string()),
            notes: None,
        }
    }

    /// A deal in `Proposal` at 40%
    pub fn deal() -> DealInput {
        DealInput {
            title: Some("Engine licence".to_string()),
            value: Some(DecimalFixtures::deal_value()),
            stage: Some(DealStage::Proposal),
            contact_id: None,
            company_id: None,
            probability: Some(40),
            close_date: Some(TemporalFixtures::close_date()),
            notes: None,
        }
    }

    /// An open call due one day after the epoch
    pub fn activity() -> ActivityInput {
        ActivityInput {
            activity_type: Some(ActivityType::Call),
            subject: Some("Follow-up call".to_string()),
            description: Some("Discuss licence terms".to_string()),
            contact_id: None,
            deal_id: None,
            due_date: Some(TemporalFixtures::hours_after_epoch(24)),
            completed: None,
        }
    }
}

/// Converts a `json!` object into a store row
pub fn row(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("row fixture must be a JSON object, got {}", other),
    }
}
