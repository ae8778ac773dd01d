//! Custom Test Assertions
//!
//! Provides assertion helpers for CRM records that give more meaningful
//! failure messages than comparing whole structs.

use domain_crm::{Activity, BulkDeleteOutcome, BulkUpdateOutcome, Contact, ContactInput, Deal, DealInput};

/// Asserts that a stored contact carries every field of `input`
///
/// Fields left out of the input must come back empty.
pub fn assert_contact_matches(contact: &Contact, input: &ContactInput) {
    assert_eq!(Some(&contact.first_name), input.first_name.as_ref(), "firstName differs");
    assert_eq!(Some(&contact.last_name), input.last_name.as_ref(), "lastName differs");
    assert_eq!(Some(&contact.email), input.email.as_ref(), "email differs");
    assert_eq!(contact.phone, input.phone, "phone differs");
    assert_eq!(contact.title, input.title, "title differs");
    assert_eq!(contact.notes, input.notes, "notes differs");
    assert_eq!(
        contact.company_id.as_ref().map(|r| r.id()),
        input.company_id,
        "companyId differs"
    );
}

/// Asserts that a stored deal carries every field of `input`
///
/// A missing probability must have defaulted to zero.
pub fn assert_deal_matches(deal: &Deal, input: &DealInput) {
    assert_eq!(Some(&deal.title), input.title.as_ref(), "title differs");
    assert_eq!(deal.value, input.value, "value differs");
    assert_eq!(Some(deal.stage), input.stage, "stage differs");
    assert_eq!(deal.probability, input.probability.unwrap_or(0), "probability differs");
    assert_eq!(deal.close_date, input.close_date, "closeDate differs");
    assert_eq!(deal.contact_id.as_ref().map(|r| r.id()), input.contact_id, "contactId differs");
    assert_eq!(deal.company_id.as_ref().map(|r| r.id()), input.company_id, "companyId differs");
    assert_eq!(deal.notes, input.notes, "notes differs");
}

/// Asserts that activities are in ascending due-date order
pub fn assert_sorted_by_due_date(activities: &[Activity]) {
    for pair in activities.windows(2) {
        assert!(
            pair[0].due_date <= pair[1].due_date,
            "Activities out of order: {:?} after {:?}",
            pair[1].due_date,
            pair[0].due_date
        );
    }
}

/// Asserts that every requested id is accounted for exactly once
pub fn assert_bulk_update_accounts_for<R>(outcome: &BulkUpdateOutcome<R>, requested: usize) {
    assert_eq!(
        outcome.success_count + outcome.error_count,
        requested,
        "success_count ({}) + error_count ({}) != requested ({})",
        outcome.success_count,
        outcome.error_count,
        requested
    );
}

/// Asserts that every requested id is accounted for exactly once
pub fn assert_bulk_delete_accounts_for<K>(outcome: &BulkDeleteOutcome<K>, requested: usize) {
    assert_eq!(
        outcome.success_count + outcome.error_count,
        requested,
        "success_count ({}) + error_count ({}) != requested ({})",
        outcome.success_count,
        outcome.error_count,
        requested
    );
}
