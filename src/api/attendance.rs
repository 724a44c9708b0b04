use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::api::{expand_rows, find_sheet, index_workers, parse_month};
use crate::auth::session::Session;
use crate::backend::{Backend, BackendError};
use crate::error::AppError;
use crate::model::attendance::BulkAttendance;
use crate::model::sheet::{CreateSheet, CreateSheetUpstream, MonthKey, SheetMeta};
use crate::model::worker::Worker;
use crate::sheet::attendance::{EditOutcome, SheetTotals, WorkerAttendanceRow};
use crate::sheet::date_range::{DayColumn, parse_boundary_date};
use crate::utils::draft_store::{AttendanceDraft, DraftKey, DraftStore, Shared, lock};

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSheetView {
    pub sheet: SheetMeta,
    #[schema(example = "July 2025")]
    pub period: String,
    pub columns: Vec<DayColumn>,
    pub rows: Vec<WorkerAttendanceRow>,
    pub totals: SheetTotals,
}

impl AttendanceSheetView {
    fn from_draft(draft: &AttendanceDraft) -> Self {
        AttendanceSheetView {
            sheet: draft.sheet.clone(),
            period: draft.sheet.month_year.label(),
            columns: draft.range.columns(),
            rows: draft.rows.clone(),
            totals: SheetTotals::from_rows(&draft.rows, draft.range.len()),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkEdit {
    #[schema(example = "w-1004")]
    pub worker_id: String,
    /// Zero-based column of the sheet.
    #[schema(example = 3)]
    pub day_index: usize,
    /// `P`, `A`, `O` (any case), or `Backspace`/`Delete`/empty to clear.
    #[schema(example = "P")]
    pub value: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkEditResponse {
    /// `false` when the value was not P/A/O or a deletion; row is then unchanged.
    pub applied: bool,
    pub row: WorkerAttendanceRow,
    pub totals: SheetTotals,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetWorker {
    #[schema(example = "w-1007")]
    pub worker_id: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSheetWorker {
    #[schema(example = "w-1007")]
    pub new_worker_id: String,
}

async fn open_draft(
    drafts: &DraftStore,
    session: &Session,
    project_id: &str,
    month: MonthKey,
) -> Result<Shared<AttendanceDraft>, AppError> {
    drafts
        .attendance(&DraftKey::new(&session.token, project_id, month))
        .await
        .ok_or_else(|| AppError::SheetNotLoaded {
            project_id: project_id.to_string(),
            month,
        })
}

/// A directory worker that may be put on a sheet line.
async fn assignable_worker(
    backend: &dyn Backend,
    session: &Session,
    worker_id: &str,
) -> Result<Worker, AppError> {
    let org_id = session.require_org()?;
    let worker = backend
        .list_workers(session, org_id)
        .await?
        .into_iter()
        .find(|w| w.id == worker_id)
        .ok_or_else(|| AppError::WorkerNotFound(worker_id.to_string()))?;
    if !worker.is_active {
        return Err(AppError::BadRequest(format!("Worker {} is inactive", worker.id)));
    }
    Ok(worker)
}

/// List attendance sheets of a project
#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/sheets",
    params(("project_id", Path, description = "Project (tender) ID")),
    responses(
        (status = 200, description = "Sheets of the project", body = [SheetMeta]),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Backend failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_sheets(
    session: Session,
    backend: web::Data<dyn Backend>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    let mut sheets = backend.list_sheets(&session, &project_id).await?;
    sheets.sort_by(|a, b| b.month_year.cmp(&a.month_year));
    Ok(HttpResponse::Ok().json(sheets))
}

/// Create an attendance sheet for a month
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/sheets",
    params(("project_id", Path, description = "Project (tender) ID")),
    request_body = CreateSheet,
    responses(
        (status = 201, description = "Sheet created", body = SheetMeta),
        (status = 400, description = "Unreadable or reversed dates"),
        (status = 502, description = "Backend failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(session, backend, body), fields(month = %body.month_year))]
pub async fn create_sheet(
    session: Session,
    backend: web::Data<dyn Backend>,
    path: web::Path<String>,
    body: web::Json<CreateSheet>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    let bad = |e: crate::sheet::date_range::DateParseError| AppError::BadRequest(e.to_string());
    let start = parse_boundary_date(&body.start_date).map_err(bad)?;
    let end = parse_boundary_date(&body.end_date).map_err(bad)?;
    if end < start {
        return Err(AppError::BadRequest(
            "Sheet end date is before its start date".to_string(),
        ));
    }

    let upstream = CreateSheetUpstream {
        tender_id: project_id,
        month_year: body.month_year,
        start_date: start.format("%d/%m/%Y").to_string(),
        end_date: end.format("%d/%m/%Y").to_string(),
    };
    let sheet = backend.create_sheet(&session, &upstream).await?;

    info!(sheet_id = %sheet.id, "Attendance sheet created");
    Ok(HttpResponse::Created().json(sheet))
}

/// Load an attendance sheet
///
/// Always re-fetches from the backend and replaces any unsaved edits this
/// session had on the sheet.
#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/sheets/{month}",
    params(
        ("project_id", Path, description = "Project (tender) ID"),
        ("month", Path, description = "Sheet month, YYYY-MM", example = "2025-07")
    ),
    responses(
        (status = 200, description = "Attendance sheet", body = AttendanceSheetView),
        (status = 400, description = "No organization selected or bad month"),
        (status = 404, description = "No sheet for that month"),
        (status = 502, description = "Backend failure or malformed sheet dates")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(session, backend, drafts, path))]
pub async fn load_sheet(
    session: Session,
    backend: web::Data<dyn Backend>,
    drafts: web::Data<DraftStore>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let org_id = session.require_org()?;
    let (project_id, month) = path.into_inner();
    let month = parse_month(&month)?;

    let sheet = find_sheet(backend.get_ref(), &session, &project_id, month).await?;
    let range = sheet.date_range()?;
    if range.is_empty() {
        warn!(sheet_id = %sheet.id, start = %range.start(), end = %range.end(), "Sheet ends before it starts");
    }

    let (data, workers) = futures::try_join!(
        backend.attendance(&session, &project_id, month),
        backend.list_workers(&session, org_id),
    )?;
    let directory = index_workers(workers);
    let rows = expand_rows(&range, &data, &directory);

    debug!(sheet_id = %sheet.id, days = range.len(), workers = rows.len(), "Attendance sheet expanded");

    let draft = AttendanceDraft::new(sheet, range, rows);
    let view = AttendanceSheetView::from_draft(&draft);
    drafts
        .open_attendance(DraftKey::new(&session.token, &project_id, month), draft)
        .await;

    Ok(HttpResponse::Ok().json(view))
}

/// Edit one attendance cell
///
/// Values other than P/A/O are ignored (`applied = false`); a deletion
/// sets the day to Off.
#[utoipa::path(
    put,
    path = "/api/projects/{project_id}/sheets/{month}/marks",
    params(
        ("project_id", Path, description = "Project (tender) ID"),
        ("month", Path, description = "Sheet month, YYYY-MM")
    ),
    request_body = MarkEdit,
    responses(
        (status = 200, description = "Edit applied or rejected", body = MarkEditResponse),
        (status = 400, description = "Day index outside the sheet"),
        (status = 404, description = "Worker not on this sheet"),
        (status = 409, description = "Sheet not loaded in this session")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn edit_mark(
    session: Session,
    drafts: web::Data<DraftStore>,
    path: web::Path<(String, String)>,
    body: web::Json<MarkEdit>,
) -> Result<HttpResponse, AppError> {
    let (project_id, month) = path.into_inner();
    let month = parse_month(&month)?;
    let draft = open_draft(&drafts, &session, &project_id, month).await?;

    let mut draft = lock(&draft);
    let days = draft.range.len();
    let row = draft
        .row_mut(&body.worker_id)
        .ok_or_else(|| AppError::WorkerNotFound(body.worker_id.clone()))?;

    let outcome = row.edit(body.day_index, &body.value)?;
    if outcome == EditOutcome::Rejected {
        debug!(worker_id = %body.worker_id, value = %body.value, "Attendance edit ignored");
    }
    let row = row.clone();

    Ok(HttpResponse::Ok().json(MarkEditResponse {
        applied: outcome == EditOutcome::Applied,
        row,
        totals: SheetTotals::from_rows(&draft.rows, days),
    }))
}

/// Add a worker to a loaded sheet, every day Off
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/sheets/{month}/workers",
    params(
        ("project_id", Path, description = "Project (tender) ID"),
        ("month", Path, description = "Sheet month, YYYY-MM")
    ),
    request_body = SheetWorker,
    responses(
        (status = 200, description = "Updated sheet", body = AttendanceSheetView),
        (status = 400, description = "Worker inactive or no organization selected"),
        (status = 404, description = "Worker not in the directory"),
        (status = 409, description = "Worker already on sheet, or sheet not loaded")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn add_worker(
    session: Session,
    backend: web::Data<dyn Backend>,
    drafts: web::Data<DraftStore>,
    path: web::Path<(String, String)>,
    body: web::Json<SheetWorker>,
) -> Result<HttpResponse, AppError> {
    let (project_id, month) = path.into_inner();
    let month = parse_month(&month)?;
    let draft = open_draft(&drafts, &session, &project_id, month).await?;

    if lock(&draft).contains(&body.worker_id) {
        return Err(AppError::WorkerAlreadyOnSheet(body.worker_id.clone()));
    }
    let worker = assignable_worker(backend.get_ref(), &session, &body.worker_id).await?;

    let mut draft = lock(&draft);
    if draft.contains(&worker.id) {
        return Err(AppError::WorkerAlreadyOnSheet(worker.id));
    }
    let days = draft.range.len();
    draft.rows.push(WorkerAttendanceRow::blank(&worker, days));
    draft.unsaved.insert(worker.id);

    Ok(HttpResponse::Ok().json(AttendanceSheetView::from_draft(&draft)))
}

/// Remove a worker from a sheet
#[utoipa::path(
    delete,
    path = "/api/projects/{project_id}/sheets/{month}/workers/{worker_id}",
    params(
        ("project_id", Path, description = "Project (tender) ID"),
        ("month", Path, description = "Sheet month, YYYY-MM"),
        ("worker_id", Path, description = "Worker to remove")
    ),
    responses(
        (status = 200, description = "Updated sheet", body = AttendanceSheetView),
        (status = 404, description = "Worker not on this sheet"),
        (status = 409, description = "Sheet not loaded in this session"),
        (status = 502, description = "Backend failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(session, backend, drafts, path))]
pub async fn remove_worker(
    session: Session,
    backend: web::Data<dyn Backend>,
    drafts: web::Data<DraftStore>,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, AppError> {
    let (project_id, month, worker_id) = path.into_inner();
    let month = parse_month(&month)?;
    let draft = open_draft(&drafts, &session, &project_id, month).await?;

    let (sheet_id, unsaved) = {
        let d = lock(&draft);
        if !d.contains(&worker_id) {
            return Err(AppError::WorkerNotFound(worker_id));
        }
        (d.sheet.id.clone(), d.unsaved.contains(&worker_id))
    };

    match backend.remove_sheet_worker(&session, &sheet_id, &worker_id).await {
        Ok(()) => info!(%sheet_id, %worker_id, "Worker removed from sheet"),
        Err(BackendError::NotFound(_)) if unsaved => {
            debug!(%worker_id, "Worker was only on the draft")
        }
        Err(e) => return Err(e.into()),
    }

    let mut draft = lock(&draft);
    draft.rows.retain(|r| r.worker_id() != worker_id);
    draft.unsaved.remove(&worker_id);

    Ok(HttpResponse::Ok().json(AttendanceSheetView::from_draft(&draft)))
}

/// Put another worker on a sheet line, keeping its marks
#[utoipa::path(
    put,
    path = "/api/projects/{project_id}/sheets/{month}/workers/{worker_id}",
    params(
        ("project_id", Path, description = "Project (tender) ID"),
        ("month", Path, description = "Sheet month, YYYY-MM"),
        ("worker_id", Path, description = "Worker currently on the line")
    ),
    request_body = ReplaceSheetWorker,
    responses(
        (status = 200, description = "Updated sheet", body = AttendanceSheetView),
        (status = 404, description = "Either worker unknown"),
        (status = 409, description = "Replacement already on sheet, or sheet not loaded"),
        (status = 502, description = "Backend failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(session, backend, drafts, path, body))]
pub async fn change_worker(
    session: Session,
    backend: web::Data<dyn Backend>,
    drafts: web::Data<DraftStore>,
    path: web::Path<(String, String, String)>,
    body: web::Json<ReplaceSheetWorker>,
) -> Result<HttpResponse, AppError> {
    let (project_id, month, worker_id) = path.into_inner();
    let month = parse_month(&month)?;
    let draft = open_draft(&drafts, &session, &project_id, month).await?;

    let (sheet_id, unsaved) = {
        let d = lock(&draft);
        if !d.contains(&worker_id) {
            return Err(AppError::WorkerNotFound(worker_id));
        }
        if d.contains(&body.new_worker_id) {
            return Err(AppError::WorkerAlreadyOnSheet(body.new_worker_id.clone()));
        }
        (d.sheet.id.clone(), d.unsaved.contains(&worker_id))
    };
    let replacement = assignable_worker(backend.get_ref(), &session, &body.new_worker_id).await?;

    match backend
        .change_sheet_worker(&session, &sheet_id, &worker_id, &replacement.id)
        .await
    {
        Ok(()) => info!(%sheet_id, from = %worker_id, to = %replacement.id, "Sheet worker changed"),
        Err(BackendError::NotFound(_)) if unsaved => {
            debug!(%worker_id, "Worker was only on the draft")
        }
        Err(e) => return Err(e.into()),
    }

    let mut draft = lock(&draft);
    if let Some(row) = draft.row_mut(&worker_id) {
        row.reassign(&replacement);
    } else {
        warn!(%worker_id, "Line disappeared while changing worker");
    }
    if draft.unsaved.remove(&worker_id) {
        draft.unsaved.insert(replacement.id.clone());
    }

    Ok(HttpResponse::Ok().json(AttendanceSheetView::from_draft(&draft)))
}

/// Save the whole sheet to the backend in one call
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/sheets/{month}/save",
    params(
        ("project_id", Path, description = "Project (tender) ID"),
        ("month", Path, description = "Sheet month, YYYY-MM")
    ),
    responses(
        (status = 200, description = "Saved", body = Object, example = json!({
            "message": "Attendance saved",
            "workers": 6
        })),
        (status = 409, description = "Sheet not loaded in this session"),
        (status = 502, description = "Backend failure, nothing saved")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(session, backend, drafts, path))]
pub async fn save_sheet(
    session: Session,
    backend: web::Data<dyn Backend>,
    drafts: web::Data<DraftStore>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (project_id, month) = path.into_inner();
    let month = parse_month(&month)?;
    let draft = open_draft(&drafts, &session, &project_id, month).await?;

    let (sheet_id, bulk) = {
        let d = lock(&draft);
        let attendances = d
            .rows
            .iter()
            .map(|r| (r.worker_id().to_string(), r.to_dated_marks(&d.range)))
            .collect();
        (
            d.sheet.id.clone(),
            BulkAttendance {
                tender_id: project_id.clone(),
                attendances,
            },
        )
    };

    backend.save_attendance(&session, &sheet_id, &bulk).await?;
    lock(&draft).unsaved.clear();

    info!(%sheet_id, workers = bulk.attendances.len(), "Attendance saved");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance saved",
        "workers": bulk.attendances.len()
    })))
}
