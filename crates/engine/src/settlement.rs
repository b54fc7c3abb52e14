//! Settlement state of a ledger entry.
//!
//! `PaymentStatus` is a **derived projection** of `paid` vs `total`: it is
//! recomputed inside the engine on every mutation and never accepted as raw
//! client input. At creation the caller classifies the entry through the
//! tagged [`Settlement`] variant instead, which carries exactly the fields
//! valid for that case.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, PaymentMethod};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    PartiallyPaid,
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::PartiallyPaid => "partially_paid",
            Self::Unpaid => "unpaid",
        }
    }

    /// The status dictated by the invariant: `paid` iff `paid >= total`,
    /// `unpaid` iff nothing has been paid, `partially_paid` otherwise.
    #[must_use]
    pub fn derive(paid: MoneyCents, total: MoneyCents) -> Self {
        if paid >= total {
            Self::Paid
        } else if paid.is_zero() {
            Self::Unpaid
        } else {
            Self::PartiallyPaid
        }
    }

    /// Returns `true` for the states that still owe money.
    #[must_use]
    pub fn is_outstanding(self) -> bool {
        matches!(self, Self::Unpaid | Self::PartiallyPaid)
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "paid" => Ok(Self::Paid),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "unpaid" => Ok(Self::Unpaid),
            other => Err(EngineError::invalid(
                "payment_status",
                format!("invalid payment status: {other}"),
            )),
        }
    }
}

/// Initial settlement classification supplied at entry creation.
///
/// Each variant carries exactly the fields that are valid for it, so the
/// conditional-field checks of a flat request body disappear:
///
/// - `Paid` is settled in full at creation and seeds a payment of `total`
///   with the given method.
/// - `PartiallyPaid` carries an explicit `paid` in `(0, total)`, the method
///   it was paid with, and the due date for the remainder; it seeds a
///   payment of `paid`.
/// - `Unpaid` has nothing paid yet: only a due date, no method.
///
/// `reference` follows the usual rule: required for every method but cash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Settlement {
    Paid {
        method: PaymentMethod,
        reference: Option<String>,
    },
    PartiallyPaid {
        paid: MoneyCents,
        method: PaymentMethod,
        reference: Option<String>,
        due_date: NaiveDate,
    },
    Unpaid {
        due_date: NaiveDate,
    },
}

impl Settlement {
    /// The status this classification starts the entry in.
    #[must_use]
    pub fn initial_status(&self) -> PaymentStatus {
        match self {
            Self::Paid { .. } => PaymentStatus::Paid,
            Self::PartiallyPaid { .. } => PaymentStatus::PartiallyPaid,
            Self::Unpaid { .. } => PaymentStatus::Unpaid,
        }
    }

    /// The due date carried by this classification, if any.
    #[must_use]
    pub fn due_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Paid { .. } => None,
            Self::PartiallyPaid { due_date, .. } | Self::Unpaid { due_date } => Some(*due_date),
        }
    }
}
