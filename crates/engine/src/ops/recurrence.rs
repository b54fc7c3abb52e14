//! Recurrence materialization.
//!
//! A recurring entry is a template: it keeps its pattern and the date of
//! the next occurrence. `materialize_due_occurrences` turns every due
//! occurrence into a fresh unpaid entry, exactly once, no matter how many
//! times a scheduler calls it.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, SqlErr, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    EngineError, Item, LedgerEntry, MoneyCents, PaymentStatus, RecurrencePattern, ResultEngine,
    entries, items, occurrences,
};

use super::{Engine, with_tx};

impl Engine {
    /// Spawn successor entries for every recurring entry whose next
    /// occurrence is on or before `as_of`. Returns the ids of the spawned
    /// entries.
    ///
    /// Each due entry is processed in its own transaction: the occurrence
    /// guard row, the successor, and the advance of the template's
    /// `next_recurrence_date` land together or not at all, and one failing
    /// entry never blocks the rest. A guard row that already exists means a
    /// previous (or concurrent) run handled the occurrence; the entry is
    /// skipped.
    pub async fn materialize_due_occurrences(&self, as_of: NaiveDate) -> ResultEngine<Vec<Uuid>> {
        let due = entries::Entity::find()
            .filter(entries::Column::IsRecurring.eq(true))
            .filter(entries::Column::NextRecurrenceDate.lte(as_of))
            .order_by_asc(entries::Column::NextRecurrenceDate)
            .order_by_asc(entries::Column::CreatedAt)
            .all(&self.database)
            .await?;

        let mut spawned = Vec::new();
        for model in due {
            let entry_id = model.id.clone();
            match self.materialize_one(model).await {
                Ok(Some(id)) => spawned.push(id),
                Ok(None) => {
                    debug!(entry_id, "occurrence already materialized, skipping");
                }
                Err(err) => {
                    warn!(entry_id, error = %err, "failed to materialize occurrence");
                }
            }
        }
        Ok(spawned)
    }

    /// One template, one occurrence. `Ok(None)` means another run got here
    /// first (existing guard or a moved version) and nothing was written.
    async fn materialize_one(&self, model: entries::Model) -> ResultEngine<Option<Uuid>> {
        let Some(occurrence_date) = model.next_recurrence_date else {
            return Ok(None);
        };
        let pattern = model
            .recurrence_pattern
            .as_deref()
            .map(RecurrencePattern::try_from)
            .transpose()?
            .ok_or_else(|| {
                EngineError::Conflict(format!("recurring entry {} has no pattern", model.id))
            })?;

        let successor_id = Uuid::new_v4();

        with_tx!(self, |db_tx| {
            let guard = occurrences::ActiveModel {
                entry_id: ActiveValue::Set(model.id.clone()),
                occurrence_date: ActiveValue::Set(occurrence_date),
                spawned_entry_id: ActiveValue::Set(successor_id.to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            };
            match occurrences::Entity::insert(guard).exec(&db_tx).await {
                Ok(_) => {}
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            }

            let template = LedgerEntry::try_from(model.clone())?;
            let source_items = items::Entity::find()
                .filter(items::Column::EntryId.eq(model.id.as_str()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Item::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let status = PaymentStatus::derive(MoneyCents::ZERO, template.total);
            let successor = LedgerEntry {
                id: successor_id,
                user_id: template.user_id.clone(),
                kind: template.kind,
                vendor: template.vendor.clone(),
                date: occurrence_date,
                total: template.total,
                paid: MoneyCents::ZERO,
                status,
                due_date: match status {
                    PaymentStatus::Paid => None,
                    _ => Some(occurrence_date),
                },
                // The successor is a plain entry; the template keeps the
                // schedule.
                is_recurring: false,
                recurrence_pattern: None,
                next_recurrence_date: None,
                origin: template.origin,
                notes: template.notes.clone(),
                created_at: Utc::now(),
                version: 0,
                items: Vec::new(),
                payments: Vec::new(),
            };

            entries::Entity::insert(entries::ActiveModel::from(&successor))
                .exec(&db_tx)
                .await?;
            for item in &source_items {
                let mut item_model = items::ActiveModel::from(item);
                item_model.id = ActiveValue::Set(Uuid::new_v4().to_string());
                item_model.entry_id = ActiveValue::Set(successor_id.to_string());
                items::Entity::insert(item_model).exec(&db_tx).await?;
            }

            // Advance the template, guarded by its version so a concurrent
            // payment on it aborts this occurrence instead of clobbering.
            let advanced = entries::Entity::update_many()
                .col_expr(
                    entries::Column::NextRecurrenceDate,
                    Expr::value(Some(pattern.advance(occurrence_date))),
                )
                .col_expr(entries::Column::Version, Expr::value(model.version + 1))
                .filter(entries::Column::Id.eq(model.id.as_str()))
                .filter(entries::Column::Version.eq(model.version))
                .exec(&db_tx)
                .await?;
            if advanced.rows_affected == 0 {
                return Ok(None);
            }

            debug!(
                template_id = model.id,
                occurrence_date = %occurrence_date,
                spawned_id = %successor_id,
                "occurrence materialized"
            );
            Ok(Some(successor_id))
        })
    }
}
