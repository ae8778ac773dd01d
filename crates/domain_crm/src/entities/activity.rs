//! Activities: calls, emails, meetings, tasks, and notes

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use validator::Validate;

use core_kernel::{format_timestamp, ActivityId, ContactId, DealId};

use super::{lenient_instant, null_as_default, Reference};
use crate::error::CrmError;
use crate::repository::EntityRepository;
use crate::schema::{EntitySchema, FieldDefault, FieldKind, FieldSpec, TimestampPolicy};
use crate::wire::{Operator, SortDirection};

/// Number of upcoming activities returned when the caller gives no limit
pub const DEFAULT_UPCOMING_LIMIT: u32 = 10;

const DUE_DATE: &str = "dueDate_c";
const COMPLETED: &str = "completed_c";

/// Kind of activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    Task,
    Note,
}

const TYPE_LABELS: &[&str] = &["Call", "Email", "Meeting", "Task", "Note"];

impl ActivityType {
    pub const ALL: [ActivityType; 5] = [
        ActivityType::Call,
        ActivityType::Email,
        ActivityType::Meeting,
        ActivityType::Task,
        ActivityType::Note,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::Call => "Call",
            ActivityType::Email => "Email",
            ActivityType::Meeting => "Meeting",
            ActivityType::Task => "Task",
            ActivityType::Note => "Note",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActivityType {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| {
                CrmError::invalid_field(
                    "type",
                    format!("Invalid activity type: {}. Must be one of: {}", s, TYPE_LABELS.join(", ")),
                )
            })
    }
}

/// Something done, or to be done, with a contact or on a deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename(serialize = "id", deserialize = "Id"))]
    pub id: ActivityId,
    #[serde(rename(serialize = "type", deserialize = "type_c"))]
    pub activity_type: ActivityType,
    #[serde(
        rename(serialize = "subject", deserialize = "subject_c"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub subject: String,
    #[serde(rename(serialize = "description", deserialize = "description_c"), default)]
    pub description: Option<String>,
    #[serde(rename(serialize = "contactId", deserialize = "contactId_c"), default)]
    pub contact_id: Option<Reference<ContactId>>,
    #[serde(rename(serialize = "dealId", deserialize = "dealId_c"), default)]
    pub deal_id: Option<Reference<DealId>>,
    #[serde(
        rename(serialize = "dueDate", deserialize = "dueDate_c"),
        default,
        deserialize_with = "lenient_instant"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(
        rename(serialize = "completed", deserialize = "completed_c"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub completed: bool,
    #[serde(
        rename(serialize = "createdAt", deserialize = "createdAt_c"),
        default,
        deserialize_with = "lenient_instant"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Activity {
    /// True when the activity is open and its due date has passed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.map_or(false, |due| due < now)
    }
}

impl EntitySchema for Activity {
    type Id = ActivityId;

    const ENTITY: &'static str = "Activity";
    const TABLE: &'static str = "activity_c";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("type_c", FieldKind::Choice(TYPE_LABELS)),
        FieldSpec::required("subject_c", FieldKind::Text),
        FieldSpec::optional("description_c", FieldKind::Text),
        FieldSpec::optional("contactId_c", FieldKind::Reference),
        FieldSpec::optional("dealId_c", FieldKind::Reference),
        FieldSpec::required(DUE_DATE, FieldKind::Timestamp),
        FieldSpec::optional(COMPLETED, FieldKind::Boolean).or_default(FieldDefault::False),
    ];
    const TIMESTAMPS: TimestampPolicy = TimestampPolicy::CreatedOnly;
    const SEARCH_FIELDS: &'static [&'static str] = &["subject_c", "description_c"];

    fn id(&self) -> ActivityId {
        self.id
    }
}

/// Fields for creating or patching an activity; `None` fields are not sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInput {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<ActivityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<ContactId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<DealId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl EntityRepository<Activity> {
    /// Every activity type
    pub fn types(&self) -> &'static [ActivityType] {
        &ActivityType::ALL
    }

    /// Activities logged against a contact
    pub async fn by_contact(&self, contact_id: ContactId) -> Vec<Activity> {
        self.find_by_reference("contactId_c", contact_id).await
    }

    /// Activities logged against a deal
    pub async fn by_deal(&self, deal_id: DealId) -> Vec<Activity> {
        self.find_by_reference("dealId_c", deal_id).await
    }

    /// Open activities due from now on, soonest first, at most `limit`
    #[instrument(skip(self))]
    pub async fn upcoming(&self, limit: u32) -> Vec<Activity> {
        let now = format_timestamp(self.now());
        let query = Self::base_query()
            .filter(COMPLETED, Operator::EqualTo, false)
            .filter(DUE_DATE, Operator::GreaterThanOrEqualTo, now)
            .order_by(DUE_DATE, SortDirection::Ascending)
            .paginate(limit, 0);
        self.degrade("upcoming", self.fetch(&query).await)
    }

    /// Open activities whose due date has passed
    #[instrument(skip(self))]
    pub async fn overdue(&self) -> Vec<Activity> {
        let now = format_timestamp(self.now());
        let query = Self::base_query()
            .filter(COMPLETED, Operator::EqualTo, false)
            .filter(DUE_DATE, Operator::LessThan, now);
        self.degrade("overdue", self.fetch(&query).await)
    }

    /// Marks an activity done, leaving its other fields untouched
    pub async fn mark_completed(&self, id: ActivityId) -> Result<Activity, CrmError> {
        self.update(id, &json!({ "completed_c": true })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_type_labels_parse() {
        for activity_type in ActivityType::ALL {
            assert_eq!(activity_type.label().parse::<ActivityType>().unwrap(), activity_type);
        }
        assert!("Lunch".parse::<ActivityType>().unwrap_err().is_validation());
    }

    #[test]
    fn test_activity_decodes_with_missing_completed() {
        let activity: Activity = serde_json::from_value(json!({
            "Id": 5,
            "type_c": "Call",
            "subject_c": "Intro call",
            "dueDate_c": "2024-05-01T09:00:00.000Z",
            "completed_c": null
        }))
        .unwrap();
        assert!(!activity.completed);
        assert_eq!(activity.contact_id, None);

        let later = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        assert!(activity.is_overdue(later));
    }

    #[test]
    fn test_input_serializes_type_key() {
        let input = ActivityInput {
            activity_type: Some(ActivityType::Meeting),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&input).unwrap(), json!({"type": "Meeting"}));
    }
}
