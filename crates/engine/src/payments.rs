//! Append-only payment records.
//!
//! Payments are never updated or deleted once written. The owning entry's
//! `paid` aggregate always equals the sum of its payment rows.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// How a payment was made. Every method except `Cash` requires an external
/// `reference` (receipt or transaction id) on the payment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    BankTransfer,
    MobileMoney,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::MobileMoney => "mobile_money",
            Self::Other => "other",
        }
    }

    /// Whether this method must carry an external reference.
    #[must_use]
    pub fn requires_reference(self) -> bool {
        !matches!(self, Self::Cash)
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "mobile_money" => Ok(Self::MobileMoney),
            "other" => Ok(Self::Other),
            other => Err(EngineError::invalid(
                "method",
                format!("invalid payment method: {other}"),
            )),
        }
    }
}

/// One partial or full payment applied to an entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub amount: MoneyCents,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
    pub recorded_by: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub entry_id: String,
    pub amount_minor: i64,
    pub method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub date: DateTimeUtc,
    pub recorded_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::entries::Entity",
        from = "Column::EntryId",
        to = "super::entries::Column::Id",
        on_delete = "Cascade"
    )]
    Entry,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Payment> for ActiveModel {
    /// `entry_id` is left unset; the caller attaches the parent id.
    fn from(payment: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(payment.id.to_string()),
            entry_id: ActiveValue::NotSet,
            amount_minor: ActiveValue::Set(payment.amount.cents()),
            method: ActiveValue::Set(payment.method.as_str().to_string()),
            reference: ActiveValue::Set(payment.reference.clone()),
            notes: ActiveValue::Set(payment.notes.clone()),
            date: ActiveValue::Set(payment.date),
            recorded_by: ActiveValue::Set(payment.recorded_by.clone()),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("payment".to_string()))?,
            amount: MoneyCents::new(model.amount_minor),
            method: PaymentMethod::try_from(model.method.as_str())?,
            reference: model.reference,
            notes: model.notes,
            date: model.date,
            recorded_by: model.recorded_by,
        })
    }
}
