//! Period keys: `YYYY-MM` month identifiers.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A natural-month accounting period key such as `2024-03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey {
    year: i32,
    month: u32,
}

impl PeriodKey {
    /// Creates a key, rejecting months outside 1..=12 and unrepresentable years.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ValidationError::InvalidPeriodKey(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// The period a business date falls into.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Calendar month, 1-based.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// First day of the period.
    #[must_use]
    pub fn start_date(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the period, inclusive.
    #[must_use]
    pub fn end_date(self) -> NaiveDate {
        self.next()
            .start_date()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    /// Whether `date` falls inside this period.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        Self::from_date(date) == self
    }

    /// The following month.
    #[must_use]
    pub const fn next(self) -> Self {
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

    /// Compact `YYYYMM` form used inside voucher numbers.
    #[must_use]
    pub fn compact(self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// Every period from `from` to `to`, both inclusive.
    ///
    /// Returns an empty list when `from` is after `to`.
    #[must_use]
    pub fn range_inclusive(from: Self, to: Self) -> Vec<Self> {
        let mut keys = Vec::new();
        let mut current = from;
        while current <= to {
            keys.push(current);
            current = current.next();
        }
        keys
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidPeriodKey(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodKey> for String {
    fn from(key: PeriodKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("2024-03", 2024, 3)]
    #[case("1999-12", 1999, 12)]
    #[case(" 2025-01 ", 2025, 1)]
    fn test_parse_valid(#[case] input: &str, #[case] year: i32, #[case] month: u32) {
        let key: PeriodKey = input.parse().unwrap();
        assert_eq!(key.year(), year);
        assert_eq!(key.month(), month);
    }

    #[rstest]
    #[case("2024-13")]
    #[case("2024-00")]
    #[case("2024-3")]
    #[case("202403")]
    #[case("abcd-01")]
    #[case("")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(matches!(
            input.parse::<PeriodKey>(),
            Err(ValidationError::InvalidPeriodKey(_))
        ));
    }

    #[test]
    fn test_date_bounds() {
        let feb_leap: PeriodKey = "2024-02".parse().unwrap();
        assert_eq!(feb_leap.start_date(), date(2024, 2, 1));
        assert_eq!(feb_leap.end_date(), date(2024, 2, 29));

        let dec: PeriodKey = "2023-12".parse().unwrap();
        assert_eq!(dec.end_date(), date(2023, 12, 31));
        assert_eq!(dec.next().to_string(), "2024-01");
    }

    #[test]
    fn test_from_date_and_contains() {
        let key = PeriodKey::from_date(date(2024, 3, 31));
        assert_eq!(key.to_string(), "2024-03");
        assert!(key.contains(date(2024, 3, 1)));
        assert!(!key.contains(date(2024, 4, 1)));
        assert_eq!(key.compact(), "202403");
    }

    #[test]
    fn test_range_inclusive() {
        let from: PeriodKey = "2023-11".parse().unwrap();
        let to: PeriodKey = "2024-02".parse().unwrap();
        let keys: Vec<String> = PeriodKey::range_inclusive(from, to)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(keys, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
        assert!(PeriodKey::range_inclusive(to, from).is_empty());
    }

    #[test]
    fn test_serde_as_string() {
        let key: PeriodKey = "2024-03".parse().unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2024-03\"");
        let back: PeriodKey = serde_json::from_str("\"2024-03\"").unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<PeriodKey>("\"2024-99\"").is_err());
    }
}
