use std::str::FromStr;

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::session::Session;
use crate::backend::Backend;
use crate::error::AppError;
use crate::model::project::{CreateProject, ProjectStatus};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ProjectQuery {
    /// e.g. `IN_PROGRESS`, any case
    #[schema(example = "IN_PROGRESS")]
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/projects",
    params(ProjectQuery),
    responses(
        (status = 200, description = "Projects of the selected organization", body = [crate::model::project::Project]),
        (status = 400, description = "No organization selected or unknown status")
    ),
    security(("bearer_auth" = [])),
    tag = "Project"
)]
pub async fn list_projects(
    session: Session,
    backend: web::Data<dyn Backend>,
    query: web::Query<ProjectQuery>,
) -> Result<HttpResponse, AppError> {
    let org_id = session.require_org()?;
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            ProjectStatus::from_str(s)
                .map_err(|_| AppError::BadRequest(format!("Unknown project status `{s}`")))
        })
        .transpose()?;

    let projects = backend.list_projects(&session, org_id, status).await?;
    Ok(HttpResponse::Ok().json(projects))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProject,
    responses(
        (status = 201, description = "Project created", body = crate::model::project::Project),
        (status = 400, description = "Missing fields or no organization selected")
    ),
    security(("bearer_auth" = [])),
    tag = "Project"
)]
#[instrument(skip(session, backend, body), fields(name = %body.name))]
pub async fn create_project(
    session: Session,
    backend: web::Data<dyn Backend>,
    body: web::Json<CreateProject>,
) -> Result<HttpResponse, AppError> {
    let org_id = session.require_org()?;
    if body.name.trim().is_empty() || body.order_no.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Project name and order number are required".to_string(),
        ));
    }

    let project = backend.create_project(&session, org_id, &body).await?;
    info!(project_id = %project.id, "Project created");
    Ok(HttpResponse::Created().json(project))
}

#[utoipa::path(
    get,
    path = "/api/projects/{project_id}",
    params(("project_id", Path, description = "Project (tender) ID")),
    responses(
        (status = 200, description = "Project found", body = crate::model::project::Project),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Project"
)]
pub async fn get_project(
    session: Session,
    backend: web::Data<dyn Backend>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let org_id = session.require_org()?;
    let project = backend.project(&session, org_id, &path).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    use crate::api::testing::{authed, test_app};

    #[actix_web::test]
    async fn filters_by_status_in_any_case() {
        let app = test_app!();

        let req = authed(test::TestRequest::get().uri("/projects?status=in_progress")).to_request();
        let running: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(running.as_array().unwrap().len(), 1);

        let req = authed(test::TestRequest::get().uri("/projects?status=COMPLETED")).to_request();
        let done: Value = test::call_and_read_body_json(&app, req).await;
        assert!(done.as_array().unwrap().is_empty());

        let req = authed(test::TestRequest::get().uri("/projects?status=paused")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn created_project_can_be_fetched() {
        let app = test_app!();
        let req = authed(test::TestRequest::post().uri("/projects"))
            .set_json(json!({
                "name": "Ash handling, ATPS Chachai",
                "orderNo": "WO-2025-17",
                "el1No": "LoA 4410",
                "startingDate": "2025-08-01",
                "tentativeEndingDate": "2026-07-31"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["status"], "PLANNING");

        let id = created["id"].as_str().unwrap();
        let req = authed(test::TestRequest::get().uri(&format!("/projects/{id}"))).to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched["name"], "Ash handling, ATPS Chachai");
    }

    #[actix_web::test]
    async fn unknown_project_is_not_found() {
        let app = test_app!();
        let req = authed(test::TestRequest::get().uri("/projects/p-none")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
