//! Ledger entry primitives.
//!
//! A `LedgerEntry` is a single expense or income record. It owns its
//! [`Item`]s (expense only) and its chronological [`Payment`] history, and
//! carries the derived settlement state plus the recurrence template fields.
//!
//! [`Item`]: crate::Item
//! [`Payment`]: crate::Payment

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, PaymentStatus, RecurrencePattern, ResultEngine, items, payments,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Expense,
    Income,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(EngineError::invalid(
                "kind",
                format!("invalid entry kind: {other}"),
            )),
        }
    }
}

/// Provenance of an ingested entry (manual form, bulk import, or OCR
/// extraction). Informational only: the engine validates all three the same
/// way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    #[default]
    Manual,
    Import,
    Ocr,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Import => "import",
            Self::Ocr => "ocr",
        }
    }
}

impl TryFrom<&str> for Origin {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "manual" => Ok(Self::Manual),
            "import" => Ok(Self::Import),
            "ocr" => Ok(Self::Ocr),
            other => Err(EngineError::invalid(
                "origin",
                format!("invalid origin: {other}"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: String,
    pub kind: EntryKind,
    /// Vendor for expenses, source for incomes. Stored trimmed and
    /// lowercased.
    pub vendor: String,
    pub date: NaiveDate,
    pub total: MoneyCents,
    pub paid: MoneyCents,
    pub status: PaymentStatus,
    pub due_date: Option<NaiveDate>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub next_recurrence_date: Option<NaiveDate>,
    pub origin: Origin,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Optimistic-concurrency counter; bumped on every mutation.
    pub version: i64,
    pub items: Vec<items::Item>,
    pub payments: Vec<payments::Payment>,
}

impl LedgerEntry {
    /// Outstanding amount still owed on this entry.
    #[must_use]
    pub fn payable(&self) -> MoneyCents {
        self.total - self.paid
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub vendor: String,
    pub date: Date,
    pub total_minor: i64,
    pub paid_minor: i64,
    pub status: String,
    pub due_date: Option<Date>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub next_recurrence_date: Option<Date>,
    pub origin: String,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::items::Entity")]
    Items,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_many = "super::occurrences::Entity")]
    Occurrences,
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::occurrences::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Occurrences.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            user_id: ActiveValue::Set(entry.user_id.clone()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            vendor: ActiveValue::Set(entry.vendor.clone()),
            date: ActiveValue::Set(entry.date),
            total_minor: ActiveValue::Set(entry.total.cents()),
            paid_minor: ActiveValue::Set(entry.paid.cents()),
            status: ActiveValue::Set(entry.status.as_str().to_string()),
            due_date: ActiveValue::Set(entry.due_date),
            is_recurring: ActiveValue::Set(entry.is_recurring),
            recurrence_pattern: ActiveValue::Set(
                entry.recurrence_pattern.map(|p| p.as_str().to_string()),
            ),
            next_recurrence_date: ActiveValue::Set(entry.next_recurrence_date),
            origin: ActiveValue::Set(entry.origin.as_str().to_string()),
            notes: ActiveValue::Set(entry.notes.clone()),
            created_at: ActiveValue::Set(entry.created_at),
            version: ActiveValue::Set(entry.version),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    /// Maps a stored row back to the domain type. Items and payments are
    /// loaded separately and start empty here.
    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("entry".to_string()))?,
            user_id: model.user_id,
            kind: EntryKind::try_from(model.kind.as_str())?,
            vendor: model.vendor,
            date: model.date,
            total: MoneyCents::new(model.total_minor),
            paid: MoneyCents::new(model.paid_minor),
            status: PaymentStatus::try_from(model.status.as_str())?,
            due_date: model.due_date,
            is_recurring: model.is_recurring,
            recurrence_pattern: model
                .recurrence_pattern
                .as_deref()
                .map(RecurrencePattern::try_from)
                .transpose()?,
            next_recurrence_date: model.next_recurrence_date,
            origin: Origin::try_from(model.origin.as_str())?,
            notes: model.notes,
            created_at: model.created_at,
            version: model.version,
            items: Vec::new(),
            payments: Vec::new(),
        })
    }
}
