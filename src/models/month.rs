//! Calendar month (`YYYY-MM`), the unit every settlement is computed over

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Returns `None` unless month is 1..=12 and year has four digits
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1000..=9999).contains(&year) && (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::of(chrono::Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // year/month are range-checked at construction, day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day() - Duration::days(1)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Number of months from `self` to `other` (negative if `other` is earlier)
    pub fn months_until(&self, other: Month) -> i32 {
        (other.year - self.year) * 12 + other.month as i32 - self.month as i32
    }

    /// The date in this month with the given day, clamped to the month's end
    pub fn clamped_day(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_else(|| self.last_day())
    }

    /// Inclusive range of months
    pub fn range(from: Month, to: Month) -> Vec<Month> {
        let mut months = Vec::new();
        let mut cursor = from;
        while cursor <= to {
            months.push(cursor);
            cursor = cursor.next();
        }
        months
    }

    /// Long name, e.g. "January 2025"
    pub fn long_name(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Error for strings that are not `YYYY-MM`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthParseError(pub String);

impl fmt::Display for MonthParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid month '{}': expected YYYY-MM", self.0)
    }
}

impl std::error::Error for MonthParseError {}

impl FromStr for Month {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MonthParseError(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(err)?;

        if year.len() != 4
            || month.len() != 2
            || !year.chars().all(|c| c.is_ascii_digit())
            || !month.chars().all(|c| c.is_ascii_digit())
        {
            return Err(err());
        }

        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Month::new(year, month).ok_or_else(err)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let month: Month = "2025-01".parse().unwrap();
        assert_eq!(month.year(), 2025);
        assert_eq!(month.month(), 1);
        assert_eq!(month.to_string(), "2025-01");
        assert_eq!(month.long_name(), "January 2025");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["2025-13", "2025-00", "2025-1", "25-01", "2025/01", "2025-01-01", "", "abcd-ef"] {
            assert!(bad.parse::<Month>().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_bounds() {
        let feb_leap: Month = "2024-02".parse().unwrap();
        assert_eq!(feb_leap.first_day(), date(2024, 2, 1));
        assert_eq!(feb_leap.last_day(), date(2024, 2, 29));
        assert!(feb_leap.contains(date(2024, 2, 29)));
        assert!(!feb_leap.contains(date(2024, 3, 1)));

        let dec: Month = "2024-12".parse().unwrap();
        assert_eq!(dec.last_day(), date(2024, 12, 31));
        assert_eq!(dec.next().to_string(), "2025-01");
        assert_eq!(dec.next().prev(), dec);
    }

    #[test]
    fn test_clamped_day() {
        let feb: Month = "2025-02".parse().unwrap();
        assert_eq!(feb.clamped_day(31), date(2025, 2, 28));
        assert_eq!(feb.clamped_day(15), date(2025, 2, 15));
    }

    #[test]
    fn test_range_and_distance() {
        let from: Month = "2024-11".parse().unwrap();
        let to: Month = "2025-02".parse().unwrap();
        let months = Month::range(from, to);
        assert_eq!(months.len(), 4);
        assert_eq!(from.months_until(to), 3);
        assert_eq!(to.months_until(from), -3);
        assert!(Month::range(to, from).is_empty());
    }

    #[test]
    fn test_serde_as_string() {
        let month: Month = "2025-03".parse().unwrap();
        assert_eq!(serde_json::to_string(&month).unwrap(), "\"2025-03\"");
        let back: Month = serde_json::from_str("\"2025-03\"").unwrap();
        assert_eq!(back, month);
        assert!(serde_json::from_str::<Month>("\"2025-3\"").is_err());
    }
}
