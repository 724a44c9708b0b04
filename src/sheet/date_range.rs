use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Formats observed at the backend boundary.
const BOUNDARY_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognised date `{0}`, expected DD/MM/YYYY or YYYY-MM-DD")]
pub struct DateParseError(pub String);

/// Parse a date string in any of the boundary formats.
///
/// ISO timestamps (`2025-07-24T00:00:00Z`) are accepted by their date part.
pub fn parse_boundary_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = raw.trim();
    let candidate = match trimmed.split_once('T') {
        Some((date, _)) => date,
        None => trimmed,
    };

    BOUNDARY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(candidate, fmt).ok())
        .ok_or_else(|| DateParseError(raw.to_string()))
}

/// Column header of an attendance sheet.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayColumn {
    pub day: u32,
    pub month: u32,
}

/// Inclusive calendar range of a sheet.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days, both ends included; zero when `end < start`.
    pub fn len(&self) -> usize {
        let span = (self.end - self.start).num_days();
        if span < 0 { 0 } else { span as usize + 1 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take(self.len()).collect()
    }

    pub fn columns(&self) -> Vec<DayColumn> {
        self.days()
            .into_iter()
            .map(|d| DayColumn {
                day: d.day(),
                month: d.month(),
            })
            .collect()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start || date > self.end {
            return None;
        }
        Some((date - self.start).num_days() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn spans_month_boundary_inclusively() {
        let range = DateRange::new(date(2025, 7, 24), date(2025, 8, 23));
        let columns = range.columns();

        assert_eq!(range.len(), 31);
        assert_eq!(columns.len(), 31);
        assert_eq!(columns[0], DayColumn { day: 24, month: 7 });
        assert_eq!(columns[7], DayColumn { day: 31, month: 7 });
        assert_eq!(columns[8], DayColumn { day: 1, month: 8 });
        assert_eq!(columns[30], DayColumn { day: 23, month: 8 });
    }

    #[test]
    fn single_day_range_has_one_column() {
        let range = DateRange::new(date(2025, 2, 28), date(2025, 2, 28));
        assert_eq!(range.len(), 1);
        assert_eq!(range.days(), vec![date(2025, 2, 28)]);
    }

    #[test]
    fn reversed_range_is_empty() {
        let range = DateRange::new(date(2025, 8, 1), date(2025, 7, 31));
        assert!(range.is_empty());
        assert!(range.columns().is_empty());
        assert_eq!(range.index_of(date(2025, 8, 1)), None);
    }

    #[test]
    fn length_matches_day_count_across_a_leap_year() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 12, 31));
        assert_eq!(range.len(), 366);
        assert_eq!(range.days().len(), 366);
        assert_eq!(range.index_of(date(2024, 3, 1)), Some(60));
    }

    #[test]
    fn boundary_dates_in_both_formats() {
        assert_eq!(parse_boundary_date("24/07/2025"), Ok(date(2025, 7, 24)));
        assert_eq!(parse_boundary_date("2025-08-23"), Ok(date(2025, 8, 23)));
        assert_eq!(
            parse_boundary_date("2025-08-23T00:00:00Z"),
            Ok(date(2025, 8, 23))
        );
        assert!(parse_boundary_date("31/06/2025").is_err());
        assert!(parse_boundary_date("Aug 23").is_err());
    }
}
