//! Materialization guard rows for recurring entries.
//!
//! One row per `(entry_id, occurrence_date)` pair. The composite primary
//! key is what makes [`materialize_due_occurrences`] idempotent: a second
//! attempt to spawn the same occurrence hits the unique constraint instead
//! of duplicating the entry.
//!
//! [`materialize_due_occurrences`]: crate::Engine::materialize_due_occurrences

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "occurrences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entry_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub occurrence_date: Date,
    pub spawned_entry_id: String,
    pub created_at: DateTimeUtc,
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
