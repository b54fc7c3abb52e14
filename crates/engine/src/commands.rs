//! Command structs for engine operations.
//!
//! These types group parameters for write operations (entry creation,
//! payment recording), keeping call sites readable and avoiding long
//! argument lists.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{EntryKind, MoneyCents, Origin, PaymentMethod, RecurrencePattern, Settlement};

/// An item line supplied at entry creation.
///
/// At least one of `unit_price` and `amount` must be given; the engine
/// derives the missing one and cross-checks them when both are present
/// (import and OCR payloads often carry only the line total).
#[derive(Clone, Debug)]
pub struct NewItem {
    pub name: String,
    /// Defaults to `uncategorized` when absent.
    pub category: Option<String>,
    pub quantity: i64,
    pub unit_price: Option<MoneyCents>,
    pub amount: Option<MoneyCents>,
}

impl NewItem {
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: i64, unit_price: MoneyCents) -> Self {
        Self {
            name: name.into(),
            category: None,
            quantity,
            unit_price: Some(unit_price),
            amount: None,
        }
    }

    /// An item line known only by its total, as import payloads supply it.
    #[must_use]
    pub fn from_amount(name: impl Into<String>, quantity: i64, amount: MoneyCents) -> Self {
        Self {
            name: name.into(),
            category: None,
            quantity,
            unit_price: None,
            amount: Some(amount),
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// Create a ledger entry (expense or income).
#[derive(Clone, Debug)]
pub struct CreateEntryCmd {
    pub user_id: String,
    pub kind: EntryKind,
    pub vendor: String,
    pub date: NaiveDate,
    pub settlement: Settlement,
    /// Required for income entries; for expenses it is derived from the
    /// items and cross-checked when supplied.
    pub total: Option<MoneyCents>,
    pub items: Vec<NewItem>,
    pub recurrence: Option<RecurrencePattern>,
    /// Overrides the first occurrence date; defaults to one pattern step
    /// after `date`.
    pub next_recurrence_date: Option<NaiveDate>,
    pub origin: Origin,
    pub notes: Option<String>,
}

impl CreateEntryCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        kind: EntryKind,
        vendor: impl Into<String>,
        date: NaiveDate,
        settlement: Settlement,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            vendor: vendor.into(),
            date,
            settlement,
            total: None,
            items: Vec::new(),
            recurrence: None,
            next_recurrence_date: None,
            origin: Origin::Manual,
            notes: None,
        }
    }

    #[must_use]
    pub fn total(mut self, total: MoneyCents) -> Self {
        self.total = Some(total);
        self
    }

    #[must_use]
    pub fn item(mut self, item: NewItem) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn items(mut self, items: impl IntoIterator<Item = NewItem>) -> Self {
        self.items.extend(items);
        self
    }

    #[must_use]
    pub fn recurrence(mut self, pattern: RecurrencePattern) -> Self {
        self.recurrence = Some(pattern);
        self
    }

    #[must_use]
    pub fn next_recurrence_date(mut self, next: NaiveDate) -> Self {
        self.next_recurrence_date = Some(next);
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Record a payment against an existing entry.
#[derive(Clone, Debug)]
pub struct RecordPaymentCmd {
    pub user_id: String,
    pub entry_id: Uuid,
    pub amount: MoneyCents,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
    /// Defaults to now when not set.
    pub date: Option<DateTime<Utc>>,
    /// Defaults to `user_id` when not set.
    pub recorded_by: Option<String>,
}

impl RecordPaymentCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, entry_id: Uuid, amount: MoneyCents) -> Self {
        Self {
            user_id: user_id.into(),
            entry_id,
            amount,
            method: PaymentMethod::default(),
            reference: None,
            notes: None,
            date: None,
            recorded_by: None,
        }
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn recorded_by(mut self, recorded_by: impl Into<String>) -> Self {
        self.recorded_by = Some(recorded_by.into());
        self
    }
}
