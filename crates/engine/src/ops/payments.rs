//! Payment reconciliation.
//!
//! `record_payment` is the only way `paid` moves. The read-modify-write is
//! guarded by a compare-and-swap on `entries.version`: the update only
//! lands if the version read at the start of the transaction is still
//! current, otherwise the whole attempt is retried with a fresh read. Two
//! concurrent payments therefore both apply, as sequential deltas.

use chrono::Utc;
use sea_orm::{
    ActiveValue, QueryFilter, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    EngineError, LedgerEntry, Payment, PaymentStatus, RecordPaymentCmd, ResultEngine, Violation,
    entries, payments,
};

use super::{Engine, entries::load_entry, normalize_optional_text, with_tx};

/// Attempts before a contended entry is given up on.
const MAX_CAS_ATTEMPTS: u32 = 5;

impl Engine {
    /// Record a payment against an entry and return the updated snapshot.
    ///
    /// The payment is append-only: `paid` grows by `amount`, the status is
    /// re-derived, and `due_date` is cleared once the entry is fully paid.
    /// A payment exceeding the outstanding amount fails [`Conflict`] and
    /// leaves the entry untouched.
    ///
    /// [`Conflict`]: EngineError::Conflict
    pub async fn record_payment(&self, cmd: RecordPaymentCmd) -> ResultEngine<LedgerEntry> {
        let mut violations = Vec::new();
        if !cmd.amount.is_positive() {
            violations.push(Violation::new("amount", "must be positive"));
        }
        let reference = normalize_optional_text(cmd.reference.as_deref());
        if cmd.method.requires_reference() && reference.is_none() {
            violations.push(Violation::new(
                "reference",
                format!("required for method {}", cmd.method.as_str()),
            ));
        }
        if !violations.is_empty() {
            return Err(EngineError::Validation(violations));
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            amount: cmd.amount,
            method: cmd.method,
            reference,
            notes: normalize_optional_text(cmd.notes.as_deref()),
            date: cmd.date.unwrap_or_else(Utc::now),
            recorded_by: cmd
                .recorded_by
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(cmd.user_id.trim())
                .to_string(),
        };

        for attempt in 0..MAX_CAS_ATTEMPTS {
            if let Some(entry) = self.try_record_payment(&cmd, &payment).await? {
                debug!(
                    entry_id = %entry.id,
                    amount = %payment.amount,
                    status = entry.status.as_str(),
                    "payment applied"
                );
                return Ok(entry);
            }
            warn!(entry_id = %cmd.entry_id, attempt, "stale entry version, retrying payment");
        }
        Err(EngineError::Conflict(
            "entry is under concurrent modification".to_string(),
        ))
    }

    /// One CAS attempt. `Ok(None)` means the version moved under us and the
    /// caller should retry.
    async fn try_record_payment(
        &self,
        cmd: &RecordPaymentCmd,
        payment: &Payment,
    ) -> ResultEngine<Option<LedgerEntry>> {
        with_tx!(self, |db_tx| {
            let id = cmd.entry_id.to_string();
            let model = entries::Entity::find_by_id(id.as_str())
                .filter(entries::Column::UserId.eq(cmd.user_id.as_str()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("entry".to_string()))?;

            let payable = model.total_minor - model.paid_minor;
            if cmd.amount.cents() > payable {
                return Err(EngineError::Conflict(format!(
                    "payment of {} exceeds outstanding {}",
                    cmd.amount,
                    crate::MoneyCents::new(payable),
                )));
            }

            let new_paid = model
                .paid_minor
                .checked_add(cmd.amount.cents())
                .ok_or_else(|| EngineError::invalid("amount", "amount too large"))?;
            let new_status = PaymentStatus::derive(
                crate::MoneyCents::new(new_paid),
                crate::MoneyCents::new(model.total_minor),
            );
            let new_due_date = match new_status {
                PaymentStatus::Paid => None,
                _ => model.due_date,
            };

            let update = entries::Entity::update_many()
                .col_expr(entries::Column::PaidMinor, Expr::value(new_paid))
                .col_expr(
                    entries::Column::Status,
                    Expr::value(new_status.as_str()),
                )
                .col_expr(entries::Column::DueDate, Expr::value(new_due_date))
                .col_expr(entries::Column::Version, Expr::value(model.version + 1))
                .filter(entries::Column::Id.eq(id.as_str()))
                .filter(entries::Column::Version.eq(model.version))
                .exec(&db_tx)
                .await?;
            if update.rows_affected == 0 {
                // Lost the race; nothing written, retry with a fresh read.
                return Ok(None);
            }

            let mut payment_model = payments::ActiveModel::from(payment);
            payment_model.entry_id = ActiveValue::Set(id.clone());
            payments::Entity::insert(payment_model).exec(&db_tx).await?;

            let entry = load_entry(&db_tx, cmd.user_id.as_str(), cmd.entry_id).await?;
            Ok(Some(entry))
        })
    }
}
