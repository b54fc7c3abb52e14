//! Line items of an expense entry.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// A single purchased line of an expense entry.
///
/// `amount` is always `unit_price * quantity`; the engine computes it at
/// creation and never accepts it from the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    /// Category label, trimmed and lowercased.
    pub category: String,
    pub quantity: i64,
    pub unit_price: MoneyCents,
    pub amount: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub entry_id: String,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub amount_minor: i64,
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

impl From<&Item> for ActiveModel {
    /// `entry_id` is left unset; the caller attaches the parent id.
    fn from(item: &Item) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            entry_id: ActiveValue::NotSet,
            name: ActiveValue::Set(item.name.clone()),
            category: ActiveValue::Set(item.category.clone()),
            quantity: ActiveValue::Set(item.quantity),
            unit_price_minor: ActiveValue::Set(item.unit_price.cents()),
            amount_minor: ActiveValue::Set(item.amount.cents()),
        }
    }
}

impl TryFrom<Model> for Item {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("item".to_string()))?,
            name: model.name,
            category: model.category,
            quantity: model.quantity,
            unit_price: MoneyCents::new(model.unit_price_minor),
            amount: MoneyCents::new(model.amount_minor),
        })
    }
}
