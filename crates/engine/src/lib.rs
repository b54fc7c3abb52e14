//! Ledger & reconciliation engine.
//!
//! The engine owns every rule of the ledger: entry validation, the
//! append-only payment history and its derived settlement status, recurring
//! entry materialization, outstanding-balance queries, and spending
//! breakdowns. Callers (bots, dashboards, importers) hand it commands and
//! consume the typed results; no collaborator ever mutates ledger state
//! directly.
//!
//! Construction follows the builder pattern:
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), engine::EngineError> {
//! let db = sea_orm::Database::connect("sqlite::memory:").await?;
//! let engine = engine::Engine::builder().database(db).build().await?;
//! # Ok(())
//! # }
//! ```

pub use commands::{CreateEntryCmd, NewItem, RecordPaymentCmd};
pub use entries::{EntryKind, LedgerEntry, Origin};
pub use error::{EngineError, Violation};
pub use items::Item;
pub use money::MoneyCents;
pub use ops::{
    BreakdownRow, DateFilter, Dimension, Engine, EngineBuilder, EntryListFilter, OutstandingEntry,
    OutstandingSort, TableRow,
};
pub use payments::{Payment, PaymentMethod};
pub use recurrence::RecurrencePattern;
pub use settlement::{PaymentStatus, Settlement};

mod commands;
mod entries;
mod error;
mod items;
mod money;
mod occurrences;
mod ops;
mod payments;
mod recurrence;
mod settlement;

pub type ResultEngine<T> = Result<T, EngineError>;
