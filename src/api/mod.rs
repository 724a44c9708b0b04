pub mod attendance;
pub mod organization;
pub mod payroll;
pub mod project;
pub mod worker;

use std::collections::HashMap;

use crate::auth::session::Session;
use crate::backend::Backend;
use crate::error::AppError;
use crate::model::attendance::AttendanceData;
use crate::model::sheet::{MonthKey, SheetMeta};
use crate::model::worker::Worker;
use crate::sheet::attendance::WorkerAttendanceRow;
use crate::sheet::date_range::DateRange;

pub(crate) fn parse_month(raw: &str) -> Result<MonthKey, AppError> {
    raw.parse()
        .map_err(|e: crate::model::sheet::MonthKeyError| AppError::BadRequest(e.to_string()))
}

/// The project's sheet for `month`, or the "no matching sheet" error.
pub(crate) async fn find_sheet(
    backend: &dyn Backend,
    session: &Session,
    project_id: &str,
    month: MonthKey,
) -> Result<SheetMeta, AppError> {
    backend
        .list_sheets(session, project_id)
        .await?
        .into_iter()
        .find(|s| s.month_year == month)
        .ok_or_else(|| AppError::SheetNotFound {
            project_id: project_id.to_string(),
            month,
        })
}

pub(crate) fn index_workers(workers: Vec<Worker>) -> HashMap<String, Worker> {
    workers.into_iter().map(|w| (w.id.clone(), w)).collect()
}

/// Backend attendance expanded onto the sheet's day range, one row per record.
pub(crate) fn expand_rows(
    range: &DateRange,
    data: &AttendanceData,
    directory: &HashMap<String, Worker>,
) -> Vec<WorkerAttendanceRow> {
    data.attendances
        .iter()
        .map(|record| WorkerAttendanceRow::from_record(range, record, directory.get(&record.worker_id)))
        .collect()
}
