//! Deals and the sales pipeline

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};
use validator::Validate;

use core_kernel::{CompanyId, ContactId, DealId};

use super::{lenient_date, lenient_instant, null_as_default, Reference};
use crate::error::CrmError;
use crate::repository::EntityRepository;
use crate::schema::{EntitySchema, FieldDefault, FieldKind, FieldSpec, TimestampPolicy};

/// Position of a deal in the sales pipeline
///
/// Ordered by pipeline position, so a `BTreeMap` keyed by stage iterates
/// from `Lead` to `ClosedLost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DealStage {
    Lead,
    Qualified,
    Proposal,
    Negotiation,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

/// Store labels, in pipeline order
const STAGE_LABELS: &[&str] = &[
    "Lead",
    "Qualified",
    "Proposal",
    "Negotiation",
    "Closed Won",
    "Closed Lost",
];

impl DealStage {
    /// Every stage, in pipeline order
    pub const ALL: [DealStage; 6] = [
        DealStage::Lead,
        DealStage::Qualified,
        DealStage::Proposal,
        DealStage::Negotiation,
        DealStage::ClosedWon,
        DealStage::ClosedLost,
    ];

    /// Label used by the store
    pub fn label(&self) -> &'static str {
        match self {
            DealStage::Lead => "Lead",
            DealStage::Qualified => "Qualified",
            DealStage::Proposal => "Proposal",
            DealStage::Negotiation => "Negotiation",
            DealStage::ClosedWon => "Closed Won",
            DealStage::ClosedLost => "Closed Lost",
        }
    }

    /// Probability implied by entering this stage, if any
    pub fn forced_probability(&self) -> Option<i64> {
        match self {
            DealStage::ClosedWon => Some(100),
            DealStage::ClosedLost => Some(0),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DealStage {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealStage::ALL
            .into_iter()
            .find(|stage| stage.label() == s)
            .ok_or_else(|| {
                CrmError::invalid_field(
                    "stage",
                    format!("Invalid stage: {}. Must be one of: {}", s, STAGE_LABELS.join(", ")),
                )
            })
    }
}

/// An opportunity moving through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    #[serde(rename(serialize = "id", deserialize = "Id"))]
    pub id: DealId,
    #[serde(
        rename(serialize = "title", deserialize = "title_c"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub title: String,
    #[serde(
        rename(serialize = "value", deserialize = "value_c"),
        default,
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub value: Option<Decimal>,
    #[serde(rename(serialize = "stage", deserialize = "stage_c"))]
    pub stage: DealStage,
    #[serde(rename(serialize = "contactId", deserialize = "contactId_c"), default)]
    pub contact_id: Option<Reference<ContactId>>,
    #[serde(rename(serialize = "companyId", deserialize = "companyId_c"), default)]
    pub company_id: Option<Reference<CompanyId>>,
    #[serde(
        rename(serialize = "probability", deserialize = "probability_c"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub probability: i64,
    #[serde(
        rename(serialize = "closeDate", deserialize = "closeDate_c"),
        default,
        deserialize_with = "lenient_date"
    )]
    pub close_date: Option<NaiveDate>,
    #[serde(rename(serialize = "notes", deserialize = "notes_c"), default)]
    pub notes: Option<String>,
    #[serde(
        rename(serialize = "createdAt", deserialize = "createdAt_c"),
        default,
        deserialize_with = "lenient_instant"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Deal {
    /// Value weighted by win probability
    pub fn weighted_value(&self) -> Decimal {
        self.value.unwrap_or_default() * Decimal::from(self.probability) / Decimal::from(100)
    }
}

impl EntitySchema for Deal {
    type Id = DealId;

    const ENTITY: &'static str = "Deal";
    const TABLE: &'static str = "deal_c";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("title_c", FieldKind::Text),
        FieldSpec::required("value_c", FieldKind::Decimal),
        FieldSpec::required("stage_c", FieldKind::Choice(STAGE_LABELS)),
        FieldSpec::optional("contactId_c", FieldKind::Reference),
        FieldSpec::optional("companyId_c", FieldKind::Reference),
        FieldSpec::optional("probability_c", FieldKind::BoundedInteger { min: 0, max: 100 })
            .or_default(FieldDefault::Zero),
        FieldSpec::required("closeDate_c", FieldKind::Date),
        FieldSpec::optional("notes_c", FieldKind::Text),
    ];
    const TIMESTAMPS: TimestampPolicy = TimestampPolicy::CreatedOnly;
    const SEARCH_FIELDS: &'static [&'static str] = &["title_c"];

    fn id(&self) -> DealId {
        self.id
    }
}

/// Fields for creating or patching a deal; `None` fields are not sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DealInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<DealStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<ContactId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 100))]
    pub probability: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Per-stage totals of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: DealStage,
    pub count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub weighted_value: Decimal,
}

impl EntityRepository<Deal> {
    /// Every stage, in pipeline order
    pub fn stages(&self) -> &'static [DealStage] {
        &DealStage::ALL
    }

    /// Moves a deal to `stage`, deriving probability for closed stages
    ///
    /// The label is checked before anything is sent; an unknown stage fails
    /// with a validation error and no store call.
    #[instrument(skip(self), fields(deal_id = %id))]
    pub async fn update_stage(&self, id: DealId, stage: &str) -> Result<Deal, CrmError> {
        let stage: DealStage = stage.parse()?;

        let mut patch = serde_json::Map::new();
        patch.insert("stage_c".to_string(), json!(stage.label()));
        if let Some(probability) = stage.forced_probability() {
            patch.insert("probability_c".to_string(), json!(probability));
        }

        let deal = self.update(id, &Value::Object(patch)).await?;
        info!(stage = %stage, probability = deal.probability, "Deal stage updated");
        Ok(deal)
    }

    /// All deals partitioned by stage; every stage is present, possibly empty
    pub async fn by_stage(&self) -> BTreeMap<DealStage, Vec<Deal>> {
        let mut grouped: BTreeMap<DealStage, Vec<Deal>> =
            DealStage::ALL.into_iter().map(|stage| (stage, Vec::new())).collect();
        for deal in self.list().await {
            grouped.entry(deal.stage).or_default().push(deal);
        }
        grouped
    }

    /// Count and value of the deals in each stage
    pub async fn pipeline_summary(&self) -> Vec<StageSummary> {
        self.by_stage()
            .await
            .into_iter()
            .map(|(stage, deals)| StageSummary {
                stage,
                count: deals.len(),
                total_value: deals.iter().filter_map(|d| d.value).sum(),
                weighted_value: deals.iter().map(Deal::weighted_value).sum(),
            })
            .collect()
    }

    /// Deals linked to a contact
    pub async fn by_contact(&self, contact_id: ContactId) -> Vec<Deal> {
        self.find_by_reference("contactId_c", contact_id).await
    }

    /// Deals linked to a company
    pub async fn by_company(&self, company_id: CompanyId) -> Vec<Deal> {
        self.find_by_reference("companyId_c", company_id).await
    }
}
