//! Date normalization for Chilean bills.
//!
//! Turns a captured date token into a billing period. Month names are
//! Chilean Spanish only; there is no locale detection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::patterns::{
    DATE_DAY_LONG_MONTH_YEAR, DATE_DAY_MONTH_ABBREV_YEAR, DATE_DAY_MONTH_YEAR_NUMERIC,
    DATE_LONG_MONTH_YEAR,
};
use crate::error::DateParseError;
use crate::models::bill::BillingPeriod;

/// Recognized date token formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `11-FEB-2025`, `11 feb 2025`.
    DayMonthAbbrevYear,
    /// `11/02/2025`, `11-02-2025`, `11.02.2025`.
    DayMonthYearNumeric,
    /// `11 de febrero de 2025`.
    DayLongMonthYear,
    /// `FEBRERO 2025`.
    LongMonthYear,
}

impl DateFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::DayMonthAbbrevYear => "day_month_abbrev_year",
            DateFormat::DayMonthYearNumeric => "day_month_year_numeric",
            DateFormat::DayLongMonthYear => "day_long_month_year",
            DateFormat::LongMonthYear => "long_month_year",
        }
    }

    /// Every format, most specific first.
    pub const ALL: &'static [DateFormat] = &[
        DateFormat::DayMonthAbbrevYear,
        DateFormat::DayMonthYearNumeric,
        DateFormat::DayLongMonthYear,
        DateFormat::LongMonthYear,
    ];

    fn parse(&self, token: &str) -> Option<BillingPeriod> {
        match self {
            DateFormat::DayMonthAbbrevYear => {
                let caps = DATE_DAY_MONTH_ABBREV_YEAR.captures(token)?;
                let month = spanish_month_to_number(&caps[2])?;
                checked_period(&caps[1], month, &caps[3])
            }
            DateFormat::DayMonthYearNumeric => {
                let caps = DATE_DAY_MONTH_YEAR_NUMERIC.captures(token)?;
                let month: u32 = caps[2].parse().ok()?;
                checked_period(&caps[1], month, &caps[3])
            }
            DateFormat::DayLongMonthYear => {
                let caps = DATE_DAY_LONG_MONTH_YEAR.captures(token)?;
                let month = spanish_month_to_number(&caps[2])?;
                checked_period(&caps[1], month, &caps[3])
            }
            DateFormat::LongMonthYear => {
                let caps = DATE_LONG_MONTH_YEAR.captures(token)?;
                let month = spanish_month_to_number(&caps[1])?;
                let year: i32 = caps[2].parse().ok()?;
                Some(BillingPeriod::new(month, year))
            }
        }
    }
}

fn checked_period(day: &str, month: u32, year: &str) -> Option<BillingPeriod> {
    let day: u32 = day.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(|_| BillingPeriod::new(month, year))
}

/// Date token normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateNormalizer;

impl DateNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Read `token` with the first hint that parses it.
    pub fn normalize(
        &self,
        token: &str,
        hints: &[DateFormat],
    ) -> Result<BillingPeriod, DateParseError> {
        let token = token.trim();
        hints
            .iter()
            .find_map(|format| format.parse(token))
            .ok_or_else(|| DateParseError {
                token: token.to_string(),
                tried: hints.iter().map(|f| f.as_str().to_string()).collect(),
            })
    }
}

/// Normalize a date token with the given hints.
pub fn normalize_date(token: &str, hints: &[DateFormat]) -> Result<BillingPeriod, DateParseError> {
    DateNormalizer::new().normalize(token, hints)
}

/// Chilean Spanish month name or abbreviation to its number.
pub fn spanish_month_to_number(month: &str) -> Option<u32> {
    let month = month.trim().trim_end_matches('.').to_lowercase();
    let n = match month.as_str() {
        "ene" | "enero" => 1,
        "feb" | "febrero" => 2,
        "mar" | "marzo" => 3,
        "abr" | "abril" => 4,
        "may" | "mayo" => 5,
        "jun" | "junio" => 6,
        "jul" | "julio" => 7,
        "ago" | "agosto" => 8,
        "sep" | "sept" | "set" | "septiembre" | "setiembre" => 9,
        "oct" | "octubre" => 10,
        "nov" | "noviembre" => 11,
        "dic" | "diciembre" => 12,
        _ => return None,
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_month_abbrev_year() {
        let period = normalize_date("11-FEB-2025", DateFormat::ALL).unwrap();
        assert_eq!(period, BillingPeriod::new(2, 2025));

        let period = normalize_date("03 dic 2024", DateFormat::ALL).unwrap();
        assert_eq!(period, BillingPeriod::new(12, 2024));
    }

    #[test]
    fn test_spanish_abbreviations_only() {
        assert_eq!(
            normalize_date("15-AGO-2024", DateFormat::ALL).unwrap(),
            BillingPeriod::new(8, 2024)
        );
        assert!(normalize_date("15-AUG-2024", DateFormat::ALL).is_err());
    }

    #[test]
    fn test_numeric_and_long_forms() {
        assert_eq!(
            normalize_date("05/02/2025", DateFormat::ALL).unwrap(),
            BillingPeriod::new(2, 2025)
        );
        assert_eq!(
            normalize_date("11 de septiembre de 2024", DateFormat::ALL).unwrap(),
            BillingPeriod::new(9, 2024)
        );
        assert_eq!(
            normalize_date("MARZO 2025", DateFormat::ALL).unwrap(),
            BillingPeriod::new(3, 2025)
        );
    }

    #[test]
    fn test_hints_are_respected() {
        let err = normalize_date("05/02/2025", &[DateFormat::DayMonthAbbrevYear]).unwrap_err();
        assert_eq!(err.token, "05/02/2025");
        assert_eq!(err.tried, vec!["day_month_abbrev_year"]);
    }

    #[test]
    fn test_invalid_calendar_date() {
        let err = normalize_date("31-FEB-2025", DateFormat::ALL).unwrap_err();
        assert_eq!(err.tried.len(), DateFormat::ALL.len());
        assert!(normalize_date("10/13/2025", DateFormat::ALL).is_err());
    }
}
