use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::sheet::date_range::{DateParseError, DateRange, parse_boundary_date};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid month key `{0}`, expected YYYY-MM")]
pub struct MonthKeyError(pub String);

/// `YYYY-MM` key of an attendance sheet.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[display(fmt = "{:04}-{:02}", year, month)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthKeyError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|_| MonthKey { year, month })
            .ok_or_else(|| MonthKeyError(format!("{year}-{month}")))
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or_default()
    }

    /// e.g. `July 2025`
    pub fn label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MonthKeyError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(err());
        }
        let year = year.parse::<i32>().map_err(|_| err())?;
        let month = month.parse::<u32>().map_err(|_| err())?;
        MonthKey::new(year, month).map_err(|_| err())
    }
}

impl TryFrom<String> for MonthKey {
    type Error = MonthKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

impl From<NaiveDate> for MonthKey {
    fn from(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Attendance sheet metadata as held by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetMeta {
    #[schema(example = "sheet-2025-07")]
    pub id: String,
    #[schema(example = "p-sgtps")]
    pub tender_id: String,
    #[schema(value_type = String, example = "2025-07")]
    pub month_year: MonthKey,
    /// `DD/MM/YYYY` or `YYYY-MM-DD`
    #[schema(example = "24/07/2025")]
    pub start_date: Option<String>,
    #[schema(example = "2025-08-23")]
    pub end_date: Option<String>,
    pub created_at: Option<String>,
}

impl SheetMeta {
    /// The sheet's day range; a sheet without explicit bounds covers its whole month.
    pub fn date_range(&self) -> Result<DateRange, DateParseError> {
        let start = match non_blank(&self.start_date) {
            Some(s) => parse_boundary_date(s)?,
            None => self.month_year.first_day(),
        };
        let end = match non_blank(&self.end_date) {
            Some(s) => parse_boundary_date(s)?,
            None => self.month_year.last_day(),
        };
        Ok(DateRange::new(start, end))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSheet {
    #[schema(value_type = String, example = "2025-07")]
    pub month_year: MonthKey,
    #[schema(example = "24/07/2025")]
    pub start_date: String,
    #[schema(example = "23/08/2025")]
    pub end_date: String,
}

/// Body sent upstream when creating a sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSheetUpstream {
    pub tender_id: String,
    pub month_year: MonthKey,
    pub start_date: String,
    pub end_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(start: Option<&str>, end: Option<&str>) -> SheetMeta {
        SheetMeta {
            id: "s-1".into(),
            tender_id: "p-1".into(),
            month_year: "2025-07".parse().unwrap(),
            start_date: start.map(String::from),
            end_date: end.map(String::from),
            created_at: None,
        }
    }

    #[test]
    fn month_key_parses_and_formats() {
        let key: MonthKey = "2025-7".parse().unwrap();
        assert_eq!(key.to_string(), "2025-07");
        assert_eq!(key.label(), "July 2025");
        assert!("2025-13".parse::<MonthKey>().is_err());
        assert!("July".parse::<MonthKey>().is_err());
        assert!("25-07".parse::<MonthKey>().is_err());
    }

    #[test]
    fn month_key_bounds_handle_december_and_leap_years() {
        let dec: MonthKey = "2024-12".parse().unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        let feb: MonthKey = "2024-02".parse().unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn month_key_serializes_as_string() {
        let key: MonthKey = serde_json::from_str("\"2025-08\"").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2025-08\"");
        assert!(serde_json::from_str::<MonthKey>("\"2025-00\"").is_err());
    }

    #[test]
    fn sheet_range_accepts_mixed_boundary_formats() {
        let range = meta(Some("24/07/2025"), Some("2025-08-23")).date_range().unwrap();
        assert_eq!(range.len(), 31);
    }

    #[test]
    fn sheet_without_bounds_covers_the_month() {
        let range = meta(None, Some("  ")).date_range().unwrap();
        assert_eq!(range.len(), 31);
        assert_eq!(range.start(), NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
    }

    #[test]
    fn malformed_boundary_date_is_an_error() {
        assert!(meta(Some("31/06/2025"), None).date_range().is_err());
    }
}
