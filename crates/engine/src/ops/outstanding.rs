//! Outstanding balance query.

use std::cmp::Ordering;

use chrono::NaiveDate;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, LedgerEntry, MoneyCents, PaymentStatus, ResultEngine, entries};

use super::{Engine, entries::hydrate, with_tx};

/// Sort key for [`Engine::list_outstanding`]. Ties always break by
/// creation order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutstandingSort {
    /// Due date ascending, entries without one last.
    #[default]
    DueDate,
    /// Outstanding amount descending.
    Payable,
    /// Vendor ascending.
    Vendor,
}

/// An unpaid or partially paid entry annotated for collection work.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutstandingEntry {
    pub entry: LedgerEntry,
    /// `total - paid`, always positive here.
    pub payable: MoneyCents,
    /// Days past the due date at the reference date: positive = overdue,
    /// 0 = due today, negative = not yet due. `None` when the entry has no
    /// due date.
    pub overdue_days: Option<i64>,
}

impl Engine {
    /// List the entries still owing money, annotated with the payable
    /// amount and how overdue they are at `as_of`.
    ///
    /// `status` may narrow the result to one of the two outstanding states;
    /// asking for `paid` entries here is a validation error. The whole read
    /// runs in a single transaction, so `paid`, `status`, and the payment
    /// history of each returned entry are mutually consistent.
    pub async fn list_outstanding(
        &self,
        user_id: &str,
        status: Option<PaymentStatus>,
        sort: OutstandingSort,
        as_of: NaiveDate,
    ) -> ResultEngine<Vec<OutstandingEntry>> {
        if status == Some(PaymentStatus::Paid) {
            return Err(EngineError::invalid(
                "status",
                "paid entries are never outstanding",
            ));
        }

        let mut result: Vec<OutstandingEntry> = with_tx!(self, |db_tx| {
            let mut query = entries::Entity::find().filter(entries::Column::UserId.eq(user_id));
            query = match status {
                Some(status) => query.filter(entries::Column::Status.eq(status.as_str())),
                None => query.filter(
                    entries::Column::Status.is_in([
                        PaymentStatus::Unpaid.as_str(),
                        PaymentStatus::PartiallyPaid.as_str(),
                    ]),
                ),
            };
            let models = query
                .order_by_asc(entries::Column::CreatedAt)
                .order_by_asc(entries::Column::Id)
                .all(&db_tx)
                .await?;

            let mut result = Vec::with_capacity(models.len());
            for model in models {
                let entry = hydrate(&db_tx, model).await?;
                let payable = entry.payable();
                let overdue_days = entry
                    .due_date
                    .map(|due| (as_of - due).num_days());
                result.push(OutstandingEntry {
                    entry,
                    payable,
                    overdue_days,
                });
            }
            Ok::<_, EngineError>(result)
        })?;

        // The base query already yields creation order, and the sort is
        // stable, so ties keep it.
        match sort {
            OutstandingSort::DueDate => result.sort_by(|a, b| match (a.entry.due_date, b.entry.due_date) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }),
            OutstandingSort::Payable => result.sort_by(|a, b| b.payable.cmp(&a.payable)),
            OutstandingSort::Vendor => {
                result.sort_by(|a, b| a.entry.vendor.cmp(&b.entry.vendor));
            }
        }
        Ok(result)
    }
}
