use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceMark, AttendanceRecord};
use crate::model::designation::Designation;
use crate::model::worker::Worker;
use crate::sheet::date_range::{DateRange, parse_boundary_date};

pub const UNKNOWN_WORKER: &str = "Unknown Worker";

/// A proposed cell value coming from the sheet editor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MarkInput {
    Set(AttendanceMark),
    /// Backspace/Delete; lands as Off.
    Clear,
}

impl MarkInput {
    /// Exactly one P/A/O character (any case), or an empty value or the
    /// `Backspace`/`Delete` key name for a deletion. Whitespace is not a mark.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw == "Backspace" || raw == "Delete" {
            return Some(MarkInput::Clear);
        }
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => AttendanceMark::from_char(c).map(MarkInput::Set),
            _ => None,
        }
    }

    pub fn mark(self) -> AttendanceMark {
        match self {
            MarkInput::Set(mark) => mark,
            MarkInput::Clear => AttendanceMark::Off,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EditOutcome {
    Applied,
    Rejected,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("day index {index} is outside a {len}-day sheet")]
pub struct DayOutOfRange {
    pub index: usize,
    pub len: usize,
}

/// One worker's line on an attendance sheet.
///
/// `present` and `ncp` are private and only ever written by [`Self::recount`],
/// which rescans the whole mark sequence.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerAttendanceRow {
    worker_id: String,
    name: String,
    designation: Designation,
    marks: Vec<AttendanceMark>,
    present: u32,
    ncp: u32,
}

impl WorkerAttendanceRow {
    pub fn new(
        worker_id: impl Into<String>,
        name: impl Into<String>,
        designation: Designation,
        marks: Vec<AttendanceMark>,
    ) -> Self {
        let mut row = WorkerAttendanceRow {
            worker_id: worker_id.into(),
            name: name.into(),
            designation,
            marks,
            present: 0,
            ncp: 0,
        };
        row.recount();
        row
    }

    /// Row for a worker newly added to a sheet: every day Off.
    pub fn blank(worker: &Worker, days: usize) -> Self {
        Self::new(
            worker.id.clone(),
            worker.name.clone(),
            worker.designation(),
            vec![AttendanceMark::Off; days],
        )
    }

    /// Expand a sparse backend record into a dense row aligned to `range`.
    ///
    /// Days without a record stay Off. Dates outside the range and
    /// unreadable dates or marks are skipped.
    pub fn from_record(range: &DateRange, record: &AttendanceRecord, worker: Option<&Worker>) -> Self {
        let mut marks = vec![AttendanceMark::Off; range.len()];

        for (raw_date, raw_mark) in &record.attendance {
            let Ok(date) = parse_boundary_date(raw_date) else {
                warn!(worker_id = %record.worker_id, date = %raw_date, "Skipping unreadable attendance date");
                continue;
            };
            let Some(index) = range.index_of(date) else {
                debug!(worker_id = %record.worker_id, %date, "Attendance date outside sheet range");
                continue;
            };
            match AttendanceMark::parse(raw_mark) {
                Some(mark) => marks[index] = mark,
                None => {
                    warn!(worker_id = %record.worker_id, %date, mark = %raw_mark, "Skipping unknown attendance mark")
                }
            }
        }

        let (name, designation) = match worker {
            Some(w) => (w.name.clone(), w.designation()),
            None => (UNKNOWN_WORKER.to_string(), Designation::Unskilled),
        };

        let row = Self::new(record.worker_id.clone(), name, designation, marks);
        if row.present != record.present_days || row.ncp != record.absent_days {
            warn!(
                worker_id = %row.worker_id,
                present = row.present,
                ncp = row.ncp,
                backend_present = record.present_days,
                backend_absent = record.absent_days,
                "Backend summary disagrees with marks, using recount"
            );
        }
        row
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn designation(&self) -> Designation {
        self.designation
    }

    #[cfg(test)]
    pub fn marks(&self) -> &[AttendanceMark] {
        &self.marks
    }

    pub fn present_count(&self) -> u32 {
        self.present
    }

    pub fn ncp_count(&self) -> u32 {
        self.ncp
    }

    /// Apply one cell edit. Input other than P/A/O or a deletion is a no-op.
    pub fn edit(&mut self, day_index: usize, raw: &str) -> Result<EditOutcome, DayOutOfRange> {
        if day_index >= self.marks.len() {
            return Err(DayOutOfRange {
                index: day_index,
                len: self.marks.len(),
            });
        }

        let Some(input) = MarkInput::parse(raw) else {
            return Ok(EditOutcome::Rejected);
        };

        self.marks[day_index] = input.mark();
        self.recount();
        Ok(EditOutcome::Applied)
    }

    /// Swap the worker on this line, keeping the marks.
    pub fn reassign(&mut self, worker: &Worker) {
        self.worker_id = worker.id.clone();
        self.name = worker.name.clone();
        self.designation = worker.designation();
    }

    /// Date string -> mark, the shape of a bulk save.
    pub fn to_dated_marks(&self, range: &DateRange) -> BTreeMap<String, AttendanceMark> {
        range
            .days()
            .into_iter()
            .zip(self.marks.iter().copied())
            .map(|(date, mark)| (date.format("%Y-%m-%d").to_string(), mark))
            .collect()
    }

    fn recount(&mut self) {
        self.present = count(&self.marks, AttendanceMark::Present);
        self.ncp = count(&self.marks, AttendanceMark::Absent);
    }
}

fn count(marks: &[AttendanceMark], wanted: AttendanceMark) -> u32 {
    marks.iter().filter(|m| **m == wanted).count() as u32
}

/// Totals row of the attendance sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetTotals {
    /// Present workers per day column.
    pub per_day: Vec<u32>,
    /// Sum of `per_day`.
    pub total_attendance: u32,
    pub total_present: u32,
    pub total_ncp: u32,
}

impl SheetTotals {
    pub fn from_rows(rows: &[WorkerAttendanceRow], days: usize) -> Self {
        let per_day: Vec<u32> = (0..days)
            .map(|i| {
                rows.iter()
                    .filter(|r| r.marks.get(i) == Some(&AttendanceMark::Present))
                    .count() as u32
            })
            .collect();

        SheetTotals {
            total_attendance: per_day.iter().sum(),
            total_present: rows.iter().map(|r| r.present).sum(),
            total_ncp: rows.iter().map(|r| r.ncp).sum(),
            per_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::model::attendance::AttendanceMark::{Absent as A, Off as O, Present as P};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(marks: &[AttendanceMark]) -> WorkerAttendanceRow {
        WorkerAttendanceRow::new("w-1", "MAN SINGH", Designation::Skilled, marks.to_vec())
    }

    fn assert_counts_fresh(row: &WorkerAttendanceRow) {
        let present = row.marks().iter().filter(|m| **m == P).count() as u32;
        let ncp = row.marks().iter().filter(|m| **m == A).count() as u32;
        assert_eq!(row.present_count(), present);
        assert_eq!(row.ncp_count(), ncp);
    }

    #[test]
    fn counts_ignore_off_days() {
        let r = row(&[P, A, O, P, O]);
        assert_eq!(r.present_count(), 2);
        assert_eq!(r.ncp_count(), 1);

        let empty = row(&[]);
        assert_eq!((empty.present_count(), empty.ncp_count()), (0, 0));

        let all_off = row(&[O; 10]);
        assert_eq!((all_off.present_count(), all_off.ncp_count()), (0, 0));
    }

    #[test]
    fn counts_follow_every_accepted_edit() {
        let mut r = row(&[O; 6]);
        let edits = [(0, "p"), (1, "A"), (0, "a"), (5, "P"), (1, "o"), (2, "Backspace"), (3, "P")];
        for (i, value) in edits {
            assert_eq!(r.edit(i, value), Ok(EditOutcome::Applied));
            assert_counts_fresh(&r);
        }
        assert_eq!(r.marks(), &[A, O, O, P, O, P]);
    }

    #[test]
    fn invalid_character_leaves_row_untouched() {
        let mut r = row(&[P, A, O]);
        let before = r.clone();

        assert_eq!(r.edit(1, "x"), Ok(EditOutcome::Rejected));
        assert_eq!(r.edit(1, "7"), Ok(EditOutcome::Rejected));
        assert_eq!(r.edit(1, "PA"), Ok(EditOutcome::Rejected));
        assert_eq!(r, before);
    }

    #[test]
    fn whitespace_is_not_a_deletion() {
        let mut r = row(&[P, A]);
        let before = r.clone();

        assert_eq!(r.edit(0, " "), Ok(EditOutcome::Rejected));
        assert_eq!(r.edit(0, "\t"), Ok(EditOutcome::Rejected));
        assert_eq!(r.edit(1, " P "), Ok(EditOutcome::Rejected));
        assert_eq!(r.edit(1, "backspace"), Ok(EditOutcome::Rejected));
        assert_eq!(r, before);
        assert_eq!(r.present_count(), 1);
    }

    #[test]
    fn deletion_gesture_equals_setting_off() {
        let mut deleted = row(&[P, A, P]);
        let mut explicit = deleted.clone();

        deleted.edit(0, "Backspace").unwrap();
        deleted.edit(1, "Delete").unwrap();
        explicit.edit(0, "O").unwrap();
        explicit.edit(1, "o").unwrap();

        assert_eq!(deleted, explicit);
        assert_eq!(deleted.present_count(), 1);
    }

    #[test]
    fn out_of_range_day_is_reported() {
        let mut r = row(&[P, P]);
        assert_eq!(r.edit(2, "A"), Err(DayOutOfRange { index: 2, len: 2 }));
        assert_eq!(r.present_count(), 2);
    }

    #[test]
    fn record_expands_to_dense_row() {
        let range = DateRange::new(date(2025, 7, 30), date(2025, 8, 2));
        let record = AttendanceRecord {
            worker_id: "w-9".into(),
            attendance: [
                ("2025-07-30", "P"),
                ("01/08/2025", "a"),
                ("2025-08-09", "P"),
                ("2025-08-02", "?"),
                ("soon", "P"),
            ]
            .into_iter()
            .map(|(d, m)| (d.to_string(), m.to_string()))
            .collect(),
            present_days: 5,
            absent_days: 0,
        };

        let r = WorkerAttendanceRow::from_record(&range, &record, None);
        assert_eq!(r.marks(), &[P, O, A, O]);
        assert_eq!(r.present_count(), 1);
        assert_eq!(r.ncp_count(), 1);
        assert_eq!(r.name(), UNKNOWN_WORKER);
        assert_eq!(r.designation(), Designation::Unskilled);
    }

    #[test]
    fn grand_total_equals_sum_of_present_counts() {
        let rows = vec![row(&[P, P, A, O]), row(&[O, P, P, P]), row(&[A, A, A, A])];
        let totals = SheetTotals::from_rows(&rows, 4);

        assert_eq!(totals.per_day, vec![1, 2, 1, 1]);
        assert_eq!(totals.total_attendance, 5);
        assert_eq!(
            totals.total_attendance,
            rows.iter().map(|r| r.present_count()).sum::<u32>()
        );
        assert_eq!(totals.total_ncp, 5);
    }

    #[test]
    fn totals_of_empty_sheet_are_zero() {
        let totals = SheetTotals::from_rows(&[], 31);
        assert_eq!(totals.per_day, vec![0; 31]);
        assert_eq!(totals.total_attendance, 0);
    }

    #[test]
    fn dated_marks_use_iso_keys() {
        let range = DateRange::new(date(2025, 7, 31), date(2025, 8, 1));
        let r = row(&[P, A]);
        let dated = r.to_dated_marks(&range);
        assert_eq!(dated.get("2025-07-31"), Some(&P));
        assert_eq!(dated.get("2025-08-01"), Some(&A));
    }

    #[test]
    fn scenario_sheet_of_twenty_seven_present_days() {
        let range = DateRange::new(date(2025, 7, 24), date(2025, 8, 23));
        let mut marks = vec![P; 27];
        marks.extend([O; 4]);
        let r = WorkerAttendanceRow::new("w-4", "UMESH KUMAR RAJAK", Designation::Skilled, marks);

        assert_eq!(range.len(), 31);
        assert_eq!(r.present_count(), 27);
        assert_eq!(r.ncp_count(), 0);
    }
}
