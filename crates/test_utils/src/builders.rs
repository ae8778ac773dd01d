//! Test Data Builders
//!
//! Provides builder patterns for constructing entity inputs with sensible
//! defaults. Tests specify only the fields they care about.

use chrono::{DateTime, NaiveDate, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::job::en::Title;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rust_decimal::Decimal;

use core_kernel::{CompanyId, ContactId, DealId};
use domain_crm::{ActivityInput, ActivityType, ContactInput, DealInput, DealStage};

use crate::fixtures::{DecimalFixtures, InputFixtures, TemporalFixtures};

/// Builder for contact inputs
#[derive(Debug, Clone)]
pub struct ContactInputBuilder {
    input: ContactInput,
}

impl Default for ContactInputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactInputBuilder {
    /// Starts from the standard contact fixture
    pub fn new() -> Self {
        Self {
            input: InputFixtures::contact(),
        }
    }

    /// Starts from a randomly named contact
    pub fn random() -> Self {
        Self {
            input: ContactInput {
                first_name: Some(FirstName().fake()),
                last_name: Some(LastName().fake()),
                email: Some(SafeEmail().fake()),
                title: Some(Title().fake()),
                ..Default::default()
            },
        }
    }

    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.input.first_name = Some(name.into());
        self
    }

    pub fn with_last_name(mut self, name: impl Into<String>) -> Self {
        self.input.last_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.input.email = Some(email.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.input.title = Some(title.into());
        self
    }

    pub fn with_company(mut self, company_id: CompanyId) -> Self {
        self.input.company_id = Some(company_id);
        self
    }

    pub fn build(self) -> ContactInput {
        self.input
    }
}

/// Builder for deal inputs
#[derive(Debug, Clone)]
pub struct DealInputBuilder {
    input: DealInput,
}

impl Default for DealInputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DealInputBuilder {
    /// Starts from the standard deal fixture
    pub fn new() -> Self {
        Self {
            input: InputFixtures::deal(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.input.title = Some(title.into());
        self
    }

    pub fn with_value(mut self, value: Decimal) -> Self {
        self.input.value = Some(value);
        self
    }

    pub fn with_stage(mut self, stage: DealStage) -> Self {
        self.input.stage = Some(stage);
        self
    }

    pub fn with_probability(mut self, probability: i64) -> Self {
        self.input.probability = Some(probability);
        self
    }

    /// Leaves probability unset so the create default applies
    pub fn without_probability(mut self) -> Self {
        self.input.probability = None;
        self
    }

    pub fn with_contact(mut self, contact_id: ContactId) -> Self {
        self.input.contact_id = Some(contact_id);
        self
    }

    pub fn with_company(mut self, company_id: CompanyId) -> Self {
        self.input.company_id = Some(company_id);
        self
    }

    pub fn with_close_date(mut self, date: NaiveDate) -> Self {
        self.input.close_date = Some(date);
        self
    }

    /// A small deal, for tests that need distinct values
    pub fn small(self) -> Self {
        self.with_value(DecimalFixtures::small_deal_value())
    }

    pub fn build(self) -> DealInput {
        self.input
    }
}

/// Builder for activity inputs
#[derive(Debug, Clone)]
pub struct ActivityInputBuilder {
    input: ActivityInput,
}

impl Default for ActivityInputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityInputBuilder {
    /// Starts from the standard activity fixture
    pub fn new() -> Self {
        Self {
            input: InputFixtures::activity(),
        }
    }

    pub fn with_type(mut self, activity_type: ActivityType) -> Self {
        self.input.activity_type = Some(activity_type);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.input.subject = Some(subject.into());
        self
    }

    pub fn due_at(mut self, due: DateTime<Utc>) -> Self {
        self.input.due_date = Some(due);
        self
    }

    /// Due `hours` after the test epoch (negative for the past)
    pub fn due_in_hours(self, hours: i64) -> Self {
        self.due_at(TemporalFixtures::hours_after_epoch(hours))
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.input.completed = Some(completed);
        self
    }

    pub fn for_contact(mut self, contact_id: ContactId) -> Self {
        self.input.contact_id = Some(contact_id);
        self
    }

    pub fn for_deal(mut self, deal_id: DealId) -> Self {
        self.input.deal_id = Some(deal_id);
        self
    }

    pub fn build(self) -> ActivityInput {
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_contact_has_required_fields() {
        let input = ContactInputBuilder::random().build();
        assert!(input.first_name.is_some());
        assert!(input.last_name.is_some());
        assert!(input.email.as_deref().unwrap_or_default().contains('@'));
    }

    #[test]
    fn test_activity_builder_due_offset() {
        let input = ActivityInputBuilder::new().due_in_hours(-2).completed(true).build();
        assert_eq!(input.due_date, Some(TemporalFixtures::hours_before_epoch(2)));
        assert_eq!(input.completed, Some(true));
    }
}
