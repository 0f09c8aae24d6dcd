//! Recurring expense templates
//!
//! A template produces one dated expense per occurrence. Monthly and yearly
//! schedules keep the day-of-month of `start_date`, clamped to shorter months,
//! so a bill anchored on the 31st lands on Feb 28 and then Mar 31 again.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::expense::SplitType;
use super::ids::{CategoryId, LocationId, RecurringId, UserId};
use super::money::Money;
use super::month::Month;

/// Upper bound on occurrences produced by a single catch-up run
pub const MAX_CATCH_UP: usize = 520;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            "yearly" | "year" | "annual" | "annually" => Ok(Self::Yearly),
            other => Err(format!(
                "Unknown frequency '{}': expected weekly, monthly or yearly",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringExpense {
    pub id: RecurringId,
    pub description: String,
    pub amount: Money,
    pub category_id: CategoryId,
    #[serde(default)]
    pub location_id: Option<LocationId>,
    pub paid_by: UserId,
    #[serde(default)]
    pub split_type: SplitType,
    pub frequency: Frequency,
    /// First occurrence; its day-of-month anchors monthly/yearly schedules
    pub start_date: NaiveDate,
    pub next_due: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub last_generated: Option<NaiveDate>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl RecurringExpense {
    pub fn new(
        description: impl Into<String>,
        amount: Money,
        category_id: CategoryId,
        paid_by: UserId,
        frequency: Frequency,
        start_date: NaiveDate,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecurringId::new(),
            description: description.into(),
            amount,
            category_id,
            location_id: None,
            paid_by,
            split_type: SplitType::default(),
            frequency,
            start_date,
            next_due: start_date,
            end_date: None,
            active: true,
            last_generated: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// The occurrence following `date` on this template's schedule
    pub fn occurrence_after(&self, date: NaiveDate) -> NaiveDate {
        let anchor_day = self.start_date.day();
        match self.frequency {
            Frequency::Weekly => date + Duration::days(7),
            Frequency::Monthly => Month::of(date).next().clamped_day(anchor_day),
            Frequency::Yearly => Month::new(date.year() + 1, self.start_date.month())
                .map(|month| month.clamped_day(anchor_day))
                .unwrap_or(date + Duration::days(365)),
        }
    }

    /// Whether an occurrence on `date` is still within the schedule
    pub fn within_end(&self, date: NaiveDate) -> bool {
        self.end_date.map_or(true, |end| date <= end)
    }

    /// Occurrences due on or before `today`, oldest first
    pub fn due_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        if !self.active {
            return dates;
        }

        let mut cursor = self.next_due;
        while cursor <= today && self.within_end(cursor) && dates.len() < MAX_CATCH_UP {
            dates.push(cursor);
            cursor = self.occurrence_after(cursor);
        }
        dates
    }

    /// Whether the schedule has run past its end date
    pub fn is_finished(&self) -> bool {
        !self.within_end(self.next_due)
    }
}

impl fmt::Display for RecurringExpense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} (next {})",
            self.description, self.amount, self.frequency, self.next_due
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn template(frequency: Frequency, start: NaiveDate) -> RecurringExpense {
        let user = UserId::new();
        RecurringExpense::new(
            "Rent",
            Money::from_cents(150000),
            CategoryId::new(),
            user,
            frequency,
            start,
            user,
        )
    }

    #[test]
    fn test_monthly_clamps_to_month_end_and_recovers() {
        let rent = template(Frequency::Monthly, date(2025, 1, 31));
        let feb = rent.occurrence_after(date(2025, 1, 31));
        assert_eq!(feb, date(2025, 2, 28));
        assert_eq!(rent.occurrence_after(feb), date(2025, 3, 31));
    }

    #[test]
    fn test_yearly_leap_day() {
        let anniversary = template(Frequency::Yearly, date(2024, 2, 29));
        assert_eq!(
            anniversary.occurrence_after(date(2024, 2, 29)),
            date(2025, 2, 28)
        );
        assert_eq!(
            anniversary.occurrence_after(date(2027, 2, 28)),
            date(2028, 2, 29)
        );
    }

    #[test]
    fn test_weekly_due_dates() {
        let cleaning = template(Frequency::Weekly, date(2025, 1, 1));
        let due = cleaning.due_dates(date(2025, 1, 22));
        assert_eq!(
            due,
            vec![date(2025, 1, 1), date(2025, 1, 8), date(2025, 1, 15), date(2025, 1, 22)]
        );
    }

    #[test]
    fn test_due_dates_respect_end_and_active() {
        let mut gym = template(Frequency::Monthly, date(2025, 1, 10));
        gym.end_date = Some(date(2025, 2, 10));
        assert_eq!(gym.due_dates(date(2025, 6, 1)).len(), 2);

        gym.active = false;
        assert!(gym.due_dates(date(2025, 6, 1)).is_empty());
    }

    #[test]
    fn test_nothing_due_before_start() {
        let rent = template(Frequency::Monthly, date(2025, 5, 1));
        assert!(rent.due_dates(date(2025, 4, 30)).is_empty());
        assert!(!rent.is_finished());
    }

    #[test]
    fn test_frequency_parse() {
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!("annual".parse::<Frequency>().unwrap(), Frequency::Yearly);
        assert!("daily".parse::<Frequency>().is_err());
    }
}
