//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating entity inputs that satisfy
//! the CRM field rules.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use domain_crm::{ActivityType, ContactInput, DealInput, DealStage};

/// Strategy for deal stages
pub fn deal_stage_strategy() -> impl Strategy<Value = DealStage> {
    prop::sample::select(DealStage::ALL.to_vec())
}

/// Strategy for activity types
pub fn activity_type_strategy() -> impl Strategy<Value = ActivityType> {
    prop::sample::select(ActivityType::ALL.to_vec())
}

/// Strategy for valid probabilities (0 to 100)
pub fn probability_strategy() -> impl Strategy<Value = i64> {
    0i64..=100i64
}

/// Strategy for out-of-range probabilities
pub fn invalid_probability_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![-1000i64..0i64, 101i64..1000i64]
}

/// Strategy for deal values with cents
pub fn deal_value_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for close dates within 2024-2026
pub fn close_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2024i32..=2026i32, 1u32..=12u32, 1u32..=28u32)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
}

/// Strategy for non-empty single-line names
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,15}"
}

/// Strategy for plausible email addresses
pub fn email_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{1,10}", "[a-z]{2,10}").prop_map(|(user, domain)| format!("{}@{}.example", user, domain))
}

/// Strategy for complete contact inputs; optional fields may be absent
pub fn contact_input_strategy() -> impl Strategy<Value = ContactInput> {
    (
        name_strategy(),
        name_strategy(),
        email_strategy(),
        proptest::option::of("[0-9]{7,12}"),
        proptest::option::of(name_strategy()),
        proptest::option::of("[a-z ]{1,40}"),
    )
        .prop_map(|(first, last, email, phone, title, notes)| ContactInput {
            first_name: Some(first),
            last_name: Some(last),
            email: Some(email),
            phone,
            company_id: None,
            title,
            notes: notes.filter(|n| !n.is_empty()),
        })
}

/// Strategy for complete deal inputs; probability may be absent
pub fn deal_input_strategy() -> impl Strategy<Value = DealInput> {
    (
        name_strategy(),
        deal_value_strategy(),
        deal_stage_strategy(),
        proptest::option::of(probability_strategy()),
        close_date_strategy(),
    )
        .prop_map(|(title, value, stage, probability, close_date)| DealInput {
            title: Some(title),
            value: Some(value),
            stage: Some(stage),
            probability,
            close_date: Some(close_date),
            ..Default::default()
        })
}
