//! Spending breakdowns.
//!
//! Aggregation runs over expense entries only and is computed engine-side
//! from one consistent read: group sums, a grand total, and per-group
//! percentage shares rounded to two decimals.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use sea_orm::{QueryFilter, QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, EntryKind, Item, MoneyCents, Origin, ResultEngine, entries, items,
};

use super::Engine;

/// Year or year-month window, half-open on `date`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateFilter {
    pub year: i32,
    pub month: Option<u32>,
}

impl DateFilter {
    #[must_use]
    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    #[must_use]
    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }

    /// The `[start, end)` interval this filter covers.
    fn range(&self) -> ResultEngine<(NaiveDate, NaiveDate)> {
        let invalid = || EngineError::invalid("date_filter", "invalid year or month");
        match self.month {
            None => {
                let start = NaiveDate::from_ymd_opt(self.year, 1, 1).ok_or_else(invalid)?;
                let end = NaiveDate::from_ymd_opt(self.year + 1, 1, 1).ok_or_else(invalid)?;
                Ok((start, end))
            }
            Some(month) => {
                let start = NaiveDate::from_ymd_opt(self.year, month, 1).ok_or_else(invalid)?;
                let end = if month == 12 {
                    NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(self.year, month + 1, 1)
                }
                .ok_or_else(invalid)?;
                Ok((start, end))
            }
        }
    }
}

/// Grouping axis for [`Engine::aggregate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    /// Item name; also sums quantities.
    Item,
    /// Vendor; also counts entries.
    Vendor,
    /// Item category.
    Category,
    /// `YYYY-MM` of the entry date.
    Month,
}

/// One group of the breakdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub key: String,
    pub amount: MoneyCents,
    /// Total quantity, for the item dimension.
    pub quantity: Option<i64>,
    /// Entry count, for the vendor dimension.
    pub count: Option<u64>,
    /// Share of the grand total, rounded to 2 decimals.
    pub percentage: f64,
}

/// One flattened item line, for table and export collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub entry_id: Uuid,
    pub vendor: String,
    pub date: NaiveDate,
    pub item_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price: MoneyCents,
    pub amount: MoneyCents,
    pub entry_total: MoneyCents,
    pub origin: Origin,
}

#[derive(Default)]
struct Group {
    amount: i64,
    quantity: i64,
    count: u64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Engine {
    /// Break expense spending down along one dimension.
    ///
    /// Groups are ordered by amount descending, equal amounts by key
    /// ascending. A window with no spending yields an empty vector, never a
    /// division by zero.
    pub async fn aggregate(
        &self,
        user_id: &str,
        dimension: Dimension,
        filter: Option<DateFilter>,
    ) -> ResultEngine<Vec<BreakdownRow>> {
        let models = self.expense_entries(user_id, filter).await?;

        let mut groups: HashMap<String, Group> = HashMap::new();
        match dimension {
            Dimension::Item | Dimension::Category => {
                for model in &models {
                    let entry_items = items::Entity::find()
                        .filter(items::Column::EntryId.eq(model.id.as_str()))
                        .all(&self.database)
                        .await?;
                    for item in entry_items {
                        let item = Item::try_from(item)?;
                        let key = match dimension {
                            Dimension::Item => item.name,
                            _ => item.category,
                        };
                        let group = groups.entry(key).or_default();
                        group.amount += item.amount.cents();
                        group.quantity += item.quantity;
                    }
                }
            }
            Dimension::Vendor => {
                for model in &models {
                    let group = groups.entry(model.vendor.clone()).or_default();
                    group.amount += model.total_minor;
                    group.count += 1;
                }
            }
            Dimension::Month => {
                for model in &models {
                    let key = format!("{:04}-{:02}", model.date.year(), model.date.month());
                    groups.entry(key).or_default().amount += model.total_minor;
                }
            }
        }

        let grand_total: i64 = groups.values().map(|g| g.amount).sum();
        if grand_total == 0 {
            return Ok(Vec::new());
        }

        let mut rows: Vec<BreakdownRow> = groups
            .into_iter()
            .map(|(key, group)| BreakdownRow {
                key,
                amount: MoneyCents::new(group.amount),
                quantity: matches!(dimension, Dimension::Item).then_some(group.quantity),
                count: matches!(dimension, Dimension::Vendor).then_some(group.count),
                percentage: round2(group.amount as f64 * 100.0 / grand_total as f64),
            })
            .collect();
        rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.key.cmp(&b.key)));
        Ok(rows)
    }

    /// Flattened per-item rows of the expense ledger, newest entries first.
    pub async fn table_rows(
        &self,
        user_id: &str,
        filter: Option<DateFilter>,
    ) -> ResultEngine<Vec<TableRow>> {
        let models = self.expense_entries(user_id, filter).await?;

        let mut rows = Vec::new();
        for model in models {
            let entry_items = items::Entity::find()
                .filter(items::Column::EntryId.eq(model.id.as_str()))
                .all(&self.database)
                .await?;
            let entry_id = Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("entry".to_string()))?;
            let origin = Origin::try_from(model.origin.as_str())?;
            for item in entry_items {
                let item = Item::try_from(item)?;
                rows.push(TableRow {
                    entry_id,
                    vendor: model.vendor.clone(),
                    date: model.date,
                    item_name: item.name,
                    category: item.category,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    amount: item.amount,
                    entry_total: MoneyCents::new(model.total_minor),
                    origin,
                });
            }
        }
        Ok(rows)
    }

    async fn expense_entries(
        &self,
        user_id: &str,
        filter: Option<DateFilter>,
    ) -> ResultEngine<Vec<entries::Model>> {
        let mut query = entries::Entity::find()
            .filter(entries::Column::UserId.eq(user_id))
            .filter(entries::Column::Kind.eq(EntryKind::Expense.as_str()));
        if let Some(filter) = filter {
            let (start, end) = filter.range()?;
            query = query
                .filter(entries::Column::Date.gte(start))
                .filter(entries::Column::Date.lt(end));
        }
        Ok(query
            .order_by_desc(entries::Column::Date)
            .order_by_desc(entries::Column::CreatedAt)
            .all(&self.database)
            .await?)
    }
}
