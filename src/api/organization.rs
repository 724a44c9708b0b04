use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::session::Session;
use crate::backend::Backend;
use crate::error::AppError;
use crate::model::organization::Organization;
use crate::model::project::{Project, ProjectStatus};

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub projects: usize,
    pub projects_in_progress: usize,
    pub workers: usize,
    pub active_workers: usize,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub organization: Organization,
    pub projects: Vec<Project>,
    pub counts: DashboardCounts,
}

#[utoipa::path(
    get,
    path = "/api/organization",
    responses(
        (status = 200, description = "Selected organization", body = Organization),
        (status = 400, description = "No organization selected"),
        (status = 404, description = "Organization not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn get_organization(
    session: Session,
    backend: web::Data<dyn Backend>,
) -> Result<HttpResponse, AppError> {
    let org_id = session.require_org()?;
    let org = backend.organization(&session, org_id).await?;
    Ok(HttpResponse::Ok().json(org))
}

/// Organization overview: detail, projects and headcount in one call
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard", body = Dashboard),
        (status = 400, description = "No organization selected")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn dashboard(
    session: Session,
    backend: web::Data<dyn Backend>,
) -> Result<HttpResponse, AppError> {
    let org_id = session.require_org()?;

    let (organization, projects, workers) = futures::try_join!(
        backend.organization(&session, org_id),
        backend.list_projects(&session, org_id, None),
        backend.list_workers(&session, org_id),
    )?;

    let counts = DashboardCounts {
        projects: projects.len(),
        projects_in_progress: projects
            .iter()
            .filter(|p| p.status == ProjectStatus::InProgress)
            .count(),
        workers: workers.len(),
        active_workers: workers.iter().filter(|w| w.is_active).count(),
    };

    Ok(HttpResponse::Ok().json(Dashboard {
        organization,
        projects,
        counts,
    }))
}
