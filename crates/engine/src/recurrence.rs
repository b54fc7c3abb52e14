//! Recurrence patterns and their calendar arithmetic.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// The calendar interval governing automatic regeneration of a template
/// entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl RecurrencePattern {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Next occurrence after `from`, pure and deterministic.
    ///
    /// Month-based patterns use calendar months and clamp day-of-month
    /// overflow (Jan 31 + 1 month = last day of February), never producing
    /// an invalid date. The offsets stay far away from chrono's date range
    /// limits for any date a ledger will ever hold, so the fallback to
    /// `from` is unreachable in practice.
    #[must_use]
    pub fn advance(self, from: NaiveDate) -> NaiveDate {
        let next = match self {
            Self::Daily => from.checked_add_days(Days::new(1)),
            Self::Weekly => from.checked_add_days(Days::new(7)),
            Self::Monthly => from.checked_add_months(Months::new(1)),
            Self::Quarterly => from.checked_add_months(Months::new(3)),
            Self::Yearly => from.checked_add_months(Months::new(12)),
        };
        next.unwrap_or(from)
    }
}

impl TryFrom<&str> for RecurrencePattern {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::invalid(
                "recurrence_pattern",
                format!("invalid recurrence pattern: {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_and_weekly_are_fixed_offsets() {
        assert_eq!(
            RecurrencePattern::Daily.advance(date(2024, 12, 31)),
            date(2025, 1, 1)
        );
        assert_eq!(
            RecurrencePattern::Weekly.advance(date(2024, 2, 26)),
            date(2024, 3, 4)
        );
    }

    #[test]
    fn monthly_clamps_day_of_month_overflow() {
        // Leap year: Jan 31 -> Feb 29.
        assert_eq!(
            RecurrencePattern::Monthly.advance(date(2024, 1, 31)),
            date(2024, 2, 29)
        );
        // Non-leap year: Jan 31 -> Feb 28.
        assert_eq!(
            RecurrencePattern::Monthly.advance(date(2023, 1, 31)),
            date(2023, 2, 28)
        );
        assert_eq!(
            RecurrencePattern::Monthly.advance(date(2024, 3, 31)),
            date(2024, 4, 30)
        );
    }

    #[test]
    fn quarterly_and_yearly_use_calendar_months() {
        assert_eq!(
            RecurrencePattern::Quarterly.advance(date(2024, 11, 30)),
            date(2025, 2, 28)
        );
        assert_eq!(
            RecurrencePattern::Yearly.advance(date(2024, 2, 29)),
            date(2025, 2, 28)
        );
    }
}
