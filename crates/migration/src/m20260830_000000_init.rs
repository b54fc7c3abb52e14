//! Initial schema migration - creates all tables from scratch.
//!
//! Complete schema for the ledger engine:
//!
//! - `entries`: expense and income records with derived settlement state
//! - `items`: purchased line items of expense entries
//! - `payments`: append-only payment history per entry
//! - `occurrences`: uniqueness guards for recurring-entry materialization

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Entries {
    Table,
    Id,
    UserId,
    Kind,
    Vendor,
    Date,
    TotalMinor,
    PaidMinor,
    Status,
    DueDate,
    IsRecurring,
    RecurrencePattern,
    NextRecurrenceDate,
    Origin,
    Notes,
    CreatedAt,
    Version,
}

#[derive(Iden)]
enum Items {
    Table,
    Id,
    EntryId,
    Name,
    Category,
    Quantity,
    UnitPriceMinor,
    AmountMinor,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    EntryId,
    AmountMinor,
    Method,
    Reference,
    Notes,
    Date,
    RecordedBy,
}

#[derive(Iden)]
enum Occurrences {
    Table,
    EntryId,
    OccurrenceDate,
    SpawnedEntryId,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Entries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Entries::UserId).string().not_null())
                    .col(ColumnDef::new(Entries::Kind).string().not_null())
                    .col(ColumnDef::new(Entries::Vendor).string().not_null())
                    .col(ColumnDef::new(Entries::Date).date().not_null())
                    .col(ColumnDef::new(Entries::TotalMinor).big_integer().not_null())
                    .col(ColumnDef::new(Entries::PaidMinor).big_integer().not_null())
                    .col(ColumnDef::new(Entries::Status).string().not_null())
                    .col(ColumnDef::new(Entries::DueDate).date())
                    .col(ColumnDef::new(Entries::IsRecurring).boolean().not_null())
                    .col(ColumnDef::new(Entries::RecurrencePattern).string())
                    .col(ColumnDef::new(Entries::NextRecurrenceDate).date())
                    .col(
                        ColumnDef::new(Entries::Origin)
                            .string()
                            .not_null()
                            .default("manual"),
                    )
                    .col(ColumnDef::new(Entries::Notes).string())
                    .col(ColumnDef::new(Entries::CreatedAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(Entries::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-user_id-date")
                    .table(Entries::Table)
                    .col(Entries::UserId)
                    .col(Entries::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-user_id-status")
                    .table(Entries::Table)
                    .col(Entries::UserId)
                    .col(Entries::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-user_id-vendor")
                    .table(Entries::Table)
                    .col(Entries::UserId)
                    .col(Entries::Vendor)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-recurring")
                    .table(Entries::Table)
                    .col(Entries::IsRecurring)
                    .col(Entries::NextRecurrenceDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Items::EntryId).string().not_null())
                    .col(ColumnDef::new(Items::Name).string().not_null())
                    .col(ColumnDef::new(Items::Category).string().not_null())
                    .col(ColumnDef::new(Items::Quantity).big_integer().not_null())
                    .col(
                        ColumnDef::new(Items::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Items::AmountMinor).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-items-entry_id")
                            .from(Items::Table, Items::EntryId)
                            .to(Entries::Table, Entries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-items-entry_id")
                    .table(Items::Table)
                    .col(Items::EntryId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::EntryId).string().not_null())
                    .col(
                        ColumnDef::new(Payments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::Method).string().not_null())
                    .col(ColumnDef::new(Payments::Reference).string())
                    .col(ColumnDef::new(Payments::Notes).string())
                    .col(ColumnDef::new(Payments::Date).timestamp().not_null())
                    .col(ColumnDef::new(Payments::RecordedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-entry_id")
                            .from(Payments::Table, Payments::EntryId)
                            .to(Entries::Table, Entries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-entry_id")
                    .table(Payments::Table)
                    .col(Payments::EntryId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Occurrences
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Occurrences::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Occurrences::EntryId).string().not_null())
                    .col(
                        ColumnDef::new(Occurrences::OccurrenceDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Occurrences::SpawnedEntryId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Occurrences::CreatedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(Occurrences::EntryId)
                            .col(Occurrences::OccurrenceDate),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-occurrences-entry_id")
                            .from(Occurrences::Table, Occurrences::EntryId)
                            .to(Entries::Table, Entries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Occurrences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entries::Table).to_owned())
            .await?;
        Ok(())
    }
}
