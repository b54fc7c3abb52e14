//! Entry store operations: create, fetch, list, delete.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    CreateEntryCmd, EngineError, EntryKind, Item, LedgerEntry, MoneyCents, NewItem, Payment,
    PaymentStatus, ResultEngine, Settlement, Violation, entries, items, occurrences, payments,
};

use super::{Engine, normalize_key, normalize_optional_text, with_tx};

/// Optional narrowing for [`Engine::list_entries`]. Date bounds are
/// inclusive.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntryListFilter {
    pub kind: Option<EntryKind>,
    pub status: Option<PaymentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl EntryListFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn from(mut self, from: NaiveDate) -> Self {
        self.from = Some(from);
        self
    }

    #[must_use]
    pub fn to(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    fn validate(&self) -> ResultEngine<()> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(EngineError::invalid("from", "range start is after end"));
        }
        Ok(())
    }
}

/// Item line with all fields resolved; produced by validation before any row
/// is written.
fn resolve_item(index: usize, item: &NewItem, violations: &mut Vec<Violation>) -> Item {
    let field = |name: &str| format!("items[{index}].{name}");

    let name = normalize_key(&item.name).unwrap_or_else(|| {
        violations.push(Violation::new(field("name"), "must not be empty"));
        String::new()
    });
    let category = item
        .category
        .as_deref()
        .and_then(normalize_key)
        .unwrap_or_else(|| "uncategorized".to_string());

    if item.quantity <= 0 {
        violations.push(Violation::new(field("quantity"), "must be positive"));
    }
    let quantity = item.quantity.max(1);

    let (unit_price, amount) = match (item.unit_price, item.amount) {
        (None, None) => {
            violations.push(Violation::new(
                field("unit_price"),
                "unit price or amount is required",
            ));
            (MoneyCents::ZERO, MoneyCents::ZERO)
        }
        (Some(unit_price), None) => {
            let amount = unit_price
                .cents()
                .checked_mul(quantity)
                .map(MoneyCents::new)
                .unwrap_or_else(|| {
                    violations.push(Violation::new(field("amount"), "amount overflows"));
                    MoneyCents::ZERO
                });
            (unit_price, amount)
        }
        (None, Some(amount)) => {
            // Round half-up to the cent.
            let unit_price = MoneyCents::new((2 * amount.cents() + quantity) / (2 * quantity));
            (unit_price, amount)
        }
        (Some(unit_price), Some(amount)) => {
            // Allow up to half a cent of rounding per unit between the
            // stated amount and unit_price × quantity.
            let expected = unit_price.cents().checked_mul(quantity);
            match expected {
                Some(expected) if (amount.cents() - expected).abs() * 2 <= quantity => {}
                _ => violations.push(Violation::new(
                    field("amount"),
                    "does not match unit price × quantity",
                )),
            }
            (unit_price, amount)
        }
    };

    if unit_price.is_negative() {
        violations.push(Violation::new(field("unit_price"), "must not be negative"));
    }
    if amount.is_negative() {
        violations.push(Violation::new(field("amount"), "must not be negative"));
    }

    Item {
        id: Uuid::new_v4(),
        name,
        category,
        quantity,
        unit_price,
        amount,
    }
}

/// Resolves the entry total: the item sum for expenses (cross-checked
/// against an explicitly supplied total), the supplied total for incomes.
fn resolve_total(
    kind: EntryKind,
    supplied: Option<MoneyCents>,
    resolved_items: &[Item],
    violations: &mut Vec<Violation>,
) -> MoneyCents {
    match kind {
        EntryKind::Expense => {
            let mut sum = MoneyCents::ZERO;
            for item in resolved_items {
                match sum.checked_add(item.amount) {
                    Some(next) => sum = next,
                    None => {
                        violations.push(Violation::new("total", "item amounts overflow"));
                        return MoneyCents::ZERO;
                    }
                }
            }
            if let Some(total) = supplied
                && total != sum
            {
                violations.push(Violation::new("total", "does not match item amounts"));
            }
            sum
        }
        EntryKind::Income => match supplied {
            Some(total) => {
                if total.is_negative() {
                    violations.push(Violation::new("total", "must not be negative"));
                }
                total
            }
            None => {
                violations.push(Violation::new("total", "required for income entries"));
                MoneyCents::ZERO
            }
        },
    }
}

/// Checks the settlement classification and returns the initial paid
/// amount plus the seed payment, if one is owed.
fn resolve_settlement(
    cmd: &CreateEntryCmd,
    total: MoneyCents,
    violations: &mut Vec<Violation>,
) -> (MoneyCents, Option<Payment>) {
    let reference_rule =
        |method: crate::PaymentMethod, reference: &Option<String>, violations: &mut Vec<Violation>| {
            if method.requires_reference() && normalize_optional_text(reference.as_deref()).is_none()
            {
                violations.push(Violation::new(
                    "reference",
                    format!("required for method {}", method.as_str()),
                ));
            }
        };
    let due_date_rule = |due_date: NaiveDate, violations: &mut Vec<Violation>| {
        if due_date < cmd.date {
            violations.push(Violation::new(
                "due_date",
                "must not precede the entry date",
            ));
        }
    };

    let seed = |amount: MoneyCents, method, reference: &Option<String>| Payment {
        id: Uuid::new_v4(),
        amount,
        method,
        reference: normalize_optional_text(reference.as_deref()),
        notes: None,
        date: Utc::now(),
        recorded_by: cmd.user_id.trim().to_string(),
    };

    match &cmd.settlement {
        Settlement::Paid { method, reference } => {
            reference_rule(*method, reference, violations);
            let payment = total.is_positive().then(|| seed(total, *method, reference));
            (total, payment)
        }
        Settlement::PartiallyPaid {
            paid,
            method,
            reference,
            due_date,
        } => {
            if !paid.is_positive() || *paid >= total {
                violations.push(Violation::new(
                    "paid",
                    "must be positive and below the total",
                ));
            }
            reference_rule(*method, reference, violations);
            due_date_rule(*due_date, violations);
            (*paid, Some(seed(*paid, *method, reference)))
        }
        Settlement::Unpaid { due_date } => {
            due_date_rule(*due_date, violations);
            (MoneyCents::ZERO, None)
        }
    }
}

/// Loads an owner-scoped entry with its items and payments attached.
pub(in crate::ops) async fn load_entry<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    entry_id: Uuid,
) -> ResultEngine<LedgerEntry> {
    let model = entries::Entity::find_by_id(entry_id.to_string())
        .filter(entries::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| EngineError::NotFound("entry".to_string()))?;
    hydrate(db, model).await
}

pub(in crate::ops) async fn hydrate<C: ConnectionTrait>(
    db: &C,
    model: entries::Model,
) -> ResultEngine<LedgerEntry> {
    let mut entry = LedgerEntry::try_from(model)?;
    let id = entry.id.to_string();
    entry.items = items::Entity::find()
        .filter(items::Column::EntryId.eq(id.as_str()))
        .all(db)
        .await?
        .into_iter()
        .map(Item::try_from)
        .collect::<ResultEngine<_>>()?;
    entry.payments = payments::Entity::find()
        .filter(payments::Column::EntryId.eq(id.as_str()))
        .order_by_asc(payments::Column::Date)
        .all(db)
        .await?
        .into_iter()
        .map(Payment::try_from)
        .collect::<ResultEngine<_>>()?;
    Ok(entry)
}

/// Builds a fully validated entry from a command, without touching storage.
pub(in crate::ops) fn build_entry(cmd: &CreateEntryCmd) -> ResultEngine<LedgerEntry> {
    let mut violations = Vec::new();

    let user_id = cmd.user_id.trim().to_string();
    if user_id.is_empty() {
        violations.push(Violation::new("user_id", "must not be empty"));
    }
    let vendor = normalize_key(&cmd.vendor).unwrap_or_else(|| {
        violations.push(Violation::new("vendor", "must not be empty"));
        String::new()
    });

    match cmd.kind {
        EntryKind::Expense if cmd.items.is_empty() => {
            violations.push(Violation::new("items", "expense requires at least one item"));
        }
        EntryKind::Income if !cmd.items.is_empty() => {
            violations.push(Violation::new("items", "income entries carry no items"));
        }
        _ => {}
    }

    let resolved_items: Vec<Item> = cmd
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| resolve_item(index, item, &mut violations))
        .collect();

    let total = resolve_total(cmd.kind, cmd.total, &resolved_items, &mut violations);
    let (paid, seed_payment) = resolve_settlement(cmd, total, &mut violations);

    match (cmd.recurrence, cmd.next_recurrence_date) {
        (None, Some(_)) => violations.push(Violation::new(
            "next_recurrence_date",
            "only valid for recurring entries",
        )),
        (Some(_), Some(next)) if next <= cmd.date => violations.push(Violation::new(
            "next_recurrence_date",
            "must follow the entry date",
        )),
        _ => {}
    }

    if !violations.is_empty() {
        return Err(EngineError::Validation(violations));
    }

    // Status is always derived, never taken from the classification: a
    // zero-total entry is born paid whatever the caller classified it as.
    let status = PaymentStatus::derive(paid, total);
    let due_date = match status {
        PaymentStatus::Paid => None,
        _ => cmd.settlement.due_date(),
    };
    let next_recurrence_date = cmd
        .recurrence
        .map(|pattern| cmd.next_recurrence_date.unwrap_or_else(|| pattern.advance(cmd.date)));

    Ok(LedgerEntry {
        id: Uuid::new_v4(),
        user_id,
        kind: cmd.kind,
        vendor,
        date: cmd.date,
        total,
        paid,
        status,
        due_date,
        is_recurring: cmd.recurrence.is_some(),
        recurrence_pattern: cmd.recurrence,
        next_recurrence_date,
        origin: cmd.origin,
        notes: normalize_optional_text(cmd.notes.as_deref()),
        created_at: Utc::now(),
        version: 0,
        items: resolved_items,
        payments: seed_payment.into_iter().collect(),
    })
}

impl Engine {
    /// Create a ledger entry.
    ///
    /// Validation collects **every** violated field before failing, so a
    /// caller can fix a bad payload in one round trip. Nothing is written
    /// unless the whole command is valid.
    pub async fn create_entry(&self, cmd: CreateEntryCmd) -> ResultEngine<LedgerEntry> {
        let entry = build_entry(&cmd)?;

        with_tx!(self, |db_tx| {
            entries::Entity::insert(entries::ActiveModel::from(&entry))
                .exec(&db_tx)
                .await?;
            for item in &entry.items {
                let mut model = items::ActiveModel::from(item);
                model.entry_id = ActiveValue::Set(entry.id.to_string());
                items::Entity::insert(model).exec(&db_tx).await?;
            }
            for payment in &entry.payments {
                let mut model = payments::ActiveModel::from(payment);
                model.entry_id = ActiveValue::Set(entry.id.to_string());
                payments::Entity::insert(model).exec(&db_tx).await?;
            }
            debug!(entry_id = %entry.id, kind = entry.kind.as_str(), "entry created");
            Ok(entry)
        })
    }

    /// Fetch one entry with its items and payment history.
    ///
    /// An absent id and an id owned by someone else both fail [`NotFound`];
    /// the two are indistinguishable on purpose.
    ///
    /// [`NotFound`]: EngineError::NotFound
    pub async fn entry(&self, user_id: &str, entry_id: Uuid) -> ResultEngine<LedgerEntry> {
        load_entry(&self.database, user_id, entry_id).await
    }

    /// List entries for one owner, newest first, optionally narrowed by
    /// kind, status, and an inclusive date range.
    pub async fn list_entries(
        &self,
        user_id: &str,
        filter: EntryListFilter,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        filter.validate()?;

        let mut query = entries::Entity::find().filter(entries::Column::UserId.eq(user_id));
        if let Some(kind) = filter.kind {
            query = query.filter(entries::Column::Kind.eq(kind.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(entries::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(entries::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(entries::Column::Date.lte(to));
        }

        let models = query
            .order_by_desc(entries::Column::Date)
            .order_by_desc(entries::Column::CreatedAt)
            .all(&self.database)
            .await?;

        let mut result = Vec::with_capacity(models.len());
        for model in models {
            result.push(hydrate(&self.database, model).await?);
        }
        Ok(result)
    }

    /// Delete an entry together with its items, payments, and occurrence
    /// guards.
    pub async fn delete_entry(&self, user_id: &str, entry_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let id = entry_id.to_string();
            entries::Entity::find_by_id(id.as_str())
                .filter(entries::Column::UserId.eq(user_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("entry".to_string()))?;

            items::Entity::delete_many()
                .filter(items::Column::EntryId.eq(id.as_str()))
                .exec(&db_tx)
                .await?;
            payments::Entity::delete_many()
                .filter(payments::Column::EntryId.eq(id.as_str()))
                .exec(&db_tx)
                .await?;
            occurrences::Entity::delete_many()
                .filter(occurrences::Column::EntryId.eq(id.as_str()))
                .exec(&db_tx)
                .await?;
            entries::Entity::delete_by_id(id.as_str())
                .exec(&db_tx)
                .await?;
            debug!(entry_id = %entry_id, "entry deleted");
            Ok(())
        })
    }
}
