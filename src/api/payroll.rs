use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::api::{expand_rows, find_sheet, index_workers, parse_month};
use crate::auth::session::Session;
use crate::backend::Backend;
use crate::config::Config;
use crate::error::AppError;
use crate::model::sheet::SheetMeta;
use crate::sheet::payment::{PaymentLine, PaymentTotals, SkillRateTable, SkillSummary};
use crate::utils::draft_store::{DraftKey, DraftStore, PaymentDraft, lock};

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSheetView {
    #[schema(example = "Fire tender and crane operation, SGTPS Birsinghpur")]
    pub project_name: String,
    #[schema(example = "M/S G.S. CONSTRUCTION")]
    pub org_name: String,
    #[schema(example = "July 2025")]
    pub period: String,
    pub sheet: SheetMeta,
    pub rates: SkillRateTable,
    pub lines: Vec<PaymentLine>,
    pub totals: PaymentTotals,
    pub skill_summary: SkillSummary,
}

impl PaymentSheetView {
    fn new(draft: &PaymentDraft, rates: SkillRateTable) -> Self {
        PaymentSheetView {
            project_name: draft.project.name.clone(),
            org_name: draft.project.org_name.clone(),
            period: draft.sheet.month_year.label(),
            sheet: draft.sheet.clone(),
            rates,
            lines: draft.lines.clone(),
            totals: PaymentTotals::from_lines(&draft.lines),
            skill_summary: SkillSummary::from_lines(&draft.lines),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtherPaymentEdit {
    #[schema(example = "w-1004")]
    pub worker_id: String,
    #[schema(example = 500.0)]
    pub amount: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtherPaymentResponse {
    pub line: PaymentLine,
    pub totals: PaymentTotals,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPayment {
    #[schema(example = "july-2025-payout")]
    pub event_name: String,
}

/// Load the payment sheet of a month
///
/// Lines are derived from the saved attendance; every load starts other
/// payments back at zero.
#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/payments/{month}",
    params(
        ("project_id", Path, description = "Project (tender) ID"),
        ("month", Path, description = "Sheet month, YYYY-MM", example = "2025-07")
    ),
    responses(
        (status = 200, description = "Payment sheet", body = PaymentSheetView),
        (status = 400, description = "No organization selected or bad month"),
        (status = 404, description = "Project or sheet not found"),
        (status = 502, description = "Backend failure or malformed sheet dates")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
#[instrument(skip(session, backend, drafts, config, path))]
pub async fn load_payments(
    session: Session,
    backend: web::Data<dyn Backend>,
    drafts: web::Data<DraftStore>,
    config: web::Data<Config>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let org_id = session.require_org()?;
    let (project_id, month) = path.into_inner();
    let month = parse_month(&month)?;

    let sheet = find_sheet(backend.get_ref(), &session, &project_id, month).await?;
    let range = sheet.date_range()?;

    let (project, data, workers) = futures::try_join!(
        backend.project(&session, org_id, &project_id),
        backend.attendance(&session, &project_id, month),
        backend.list_workers(&session, org_id),
    )?;

    let rows = expand_rows(&range, &data, &index_workers(workers));
    let lines: Vec<PaymentLine> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| PaymentLine::derive(i + 1, row, &config.rates))
        .collect();

    info!(sheet_id = %sheet.id, lines = lines.len(), "Payment sheet derived");

    let draft = PaymentDraft { sheet, project, lines };
    let view = PaymentSheetView::new(&draft, config.rates);
    drafts
        .open_payments(DraftKey::new(&session.token, &project_id, month), draft)
        .await;

    Ok(HttpResponse::Ok().json(view))
}

/// Set the other payment of one line
#[utoipa::path(
    put,
    path = "/api/projects/{project_id}/payments/{month}/other-payment",
    params(
        ("project_id", Path, description = "Project (tender) ID"),
        ("month", Path, description = "Sheet month, YYYY-MM")
    ),
    request_body = OtherPaymentEdit,
    responses(
        (status = 200, description = "Line recomputed", body = OtherPaymentResponse),
        (status = 400, description = "Negative amount"),
        (status = 404, description = "Worker not on this payment sheet"),
        (status = 409, description = "Payment sheet not loaded in this session")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn set_other_payment(
    session: Session,
    drafts: web::Data<DraftStore>,
    path: web::Path<(String, String)>,
    body: web::Json<OtherPaymentEdit>,
) -> Result<HttpResponse, AppError> {
    let (project_id, month) = path.into_inner();
    let month = parse_month(&month)?;
    let draft = drafts
        .payments(&DraftKey::new(&session.token, &project_id, month))
        .await
        .ok_or(AppError::SheetNotLoaded { project_id, month })?;

    let mut draft = lock(&draft);
    let line = draft
        .line_mut(&body.worker_id)
        .ok_or_else(|| AppError::WorkerNotFound(body.worker_id.clone()))?;
    line.set_other_payment(body.amount)?;
    debug!(worker_id = %body.worker_id, total = line.total_payment(), "Other payment set");
    let line = line.clone();

    Ok(HttpResponse::Ok().json(OtherPaymentResponse {
        line,
        totals: PaymentTotals::from_lines(&draft.lines),
    }))
}

/// Run ECR processing for the month's sheet
///
/// The backend answers with the ECR rows it could build, the workers it
/// could not, and the pipe text for upload.
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/payments/{month}/process",
    params(
        ("project_id", Path, description = "Project (tender) ID"),
        ("month", Path, description = "Sheet month, YYYY-MM")
    ),
    request_body = ProcessPayment,
    responses(
        (status = 200, description = "Processing result", body = crate::model::attendance::ProcessResponse),
        (status = 400, description = "Event name missing"),
        (status = 404, description = "No sheet for that month"),
        (status = 502, description = "Backend failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
#[instrument(skip(session, backend, path, body), fields(event = %body.event_name))]
pub async fn process_payment(
    session: Session,
    backend: web::Data<dyn Backend>,
    path: web::Path<(String, String)>,
    body: web::Json<ProcessPayment>,
) -> Result<HttpResponse, AppError> {
    let event_name = body.event_name.trim();
    if event_name.is_empty() {
        return Err(AppError::BadRequest("Event name is required".to_string()));
    }
    let (project_id, month) = path.into_inner();
    let month = parse_month(&month)?;

    let sheet = find_sheet(backend.get_ref(), &session, &project_id, month).await?;
    let resp = backend.process_payment(&session, event_name, &sheet.id).await?;

    if resp.missing.is_empty() {
        info!(sheet_id = %sheet.id, processed = resp.processed.len(), "Payment processed");
    } else {
        warn!(
            sheet_id = %sheet.id,
            processed = resp.processed.len(),
            missing = resp.missing.len(),
            "Payment processed with missing workers"
        );
    }
    Ok(HttpResponse::Ok().json(resp))
}
