use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::session::Session;
use crate::backend::Backend;
use crate::error::AppError;
use crate::model::worker::{CreateWorker, Worker};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WorkerQuery {
    /// Matched against name, UAN, contact number and tags
    #[schema(example = "singh")]
    pub search: Option<String>,
    pub active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerListResponse {
    pub data: Vec<Worker>,
    /// Workers after filtering.
    pub total: usize,
    /// Active workers among `data`.
    pub active: usize,
}

#[utoipa::path(
    get,
    path = "/api/workers",
    params(WorkerQuery),
    responses(
        (status = 200, description = "Worker directory of the selected organization", body = WorkerListResponse),
        (status = 400, description = "No organization selected")
    ),
    security(("bearer_auth" = [])),
    tag = "Worker"
)]
pub async fn list_workers(
    session: Session,
    backend: web::Data<dyn Backend>,
    query: web::Query<WorkerQuery>,
) -> Result<HttpResponse, AppError> {
    let org_id = session.require_org()?;
    let term = query.search.as_deref().unwrap_or_default();

    let data: Vec<Worker> = backend
        .list_workers(&session, org_id)
        .await?
        .into_iter()
        .filter(|w| query.active.is_none_or(|active| w.is_active == active))
        .filter(|w| w.matches(term))
        .collect();

    Ok(HttpResponse::Ok().json(WorkerListResponse {
        total: data.len(),
        active: data.iter().filter(|w| w.is_active).count(),
        data,
    }))
}

#[utoipa::path(
    post,
    path = "/api/workers",
    request_body = CreateWorker,
    responses(
        (status = 201, description = "Worker registered", body = Worker),
        (status = 400, description = "Name or UAN missing"),
        (status = 502, description = "Backend refused the worker, e.g. duplicate UAN")
    ),
    security(("bearer_auth" = [])),
    tag = "Worker"
)]
#[instrument(skip(session, backend, body), fields(name = %body.name))]
pub async fn create_worker(
    session: Session,
    backend: web::Data<dyn Backend>,
    body: web::Json<CreateWorker>,
) -> Result<HttpResponse, AppError> {
    let org_id = session.require_org()?;
    let mut worker = body.into_inner();
    worker.name = worker.name.trim().to_string();
    worker.uan_number = worker.uan_number.trim().to_string();

    if worker.name.is_empty() {
        return Err(AppError::BadRequest("Worker name is required".to_string()));
    }
    if worker.uan_number.is_empty() || !worker.uan_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest("UAN must be a number".to_string()));
    }
    if worker.org_ids.is_empty() {
        worker.org_ids.push(org_id.to_string());
    }

    let created = backend.create_worker(&session, &worker).await?;
    info!(worker_id = %created.id, "Worker registered");
    Ok(HttpResponse::Created().json(created))
}
