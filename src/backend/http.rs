use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use super::{Backend, BackendError, BackendResult};
use crate::auth::session::Session;
use crate::model::attendance::{
    AttendanceData, BulkAttendance, ChangeSheetWorker, ProcessPaymentRequest, ProcessResponse,
};
use crate::model::organization::{Organization, UserProfile};
use crate::model::project::{CreateProject, Project, ProjectStatus};
use crate::model::sheet::{CreateSheetUpstream, MonthKey, SheetMeta};
use crate::model::worker::{CreateWorker, Worker};
use crate::models::{SignInRequest, SignInResponse};

/// JSON-over-HTTP client for the real backend.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        HttpBackend {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Backend request");
        self.client.request(method, url)
    }

    fn authed(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        self.request(method, path).bearer_auth(&session.token)
    }

    async fn send(&self, req: RequestBuilder) -> BackendResult<reqwest::Response> {
        let resp = req.send().await.map_err(|e| {
            error!(error = %e, "Backend unreachable");
            BackendError::Transport(e)
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        error!(status = status.as_u16(), %body, "Backend returned an error");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized,
            StatusCode::NOT_FOUND => BackendError::NotFound(body),
            _ => BackendError::Status {
                status: status.as_u16(),
                body,
            },
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> BackendResult<T> {
        self.send(req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn sign_in(&self, credentials: &SignInRequest) -> BackendResult<SignInResponse> {
        self.fetch(self.request(Method::POST, "/auth/signin").json(credentials))
            .await
    }

    async fn current_user(&self, session: &Session) -> BackendResult<UserProfile> {
        self.fetch(self.authed(Method::GET, "/users/me", session)).await
    }

    async fn organization(&self, session: &Session, org_id: &str) -> BackendResult<Organization> {
        self.fetch(self.authed(Method::GET, &format!("/orgs/{org_id}"), session))
            .await
    }

    async fn list_projects(
        &self,
        session: &Session,
        org_id: &str,
        status: Option<ProjectStatus>,
    ) -> BackendResult<Vec<Project>> {
        let mut req = self.authed(Method::GET, &format!("/orgs/{org_id}/projects"), session);
        if let Some(status) = status {
            req = req.query(&[("status", status.to_string())]);
        }
        self.fetch(req).await
    }

    async fn project(&self, session: &Session, org_id: &str, project_id: &str) -> BackendResult<Project> {
        self.fetch(self.authed(
            Method::GET,
            &format!("/orgs/{org_id}/projects/{project_id}"),
            session,
        ))
        .await
    }

    async fn create_project(
        &self,
        session: &Session,
        org_id: &str,
        project: &CreateProject,
    ) -> BackendResult<Project> {
        self.fetch(
            self.authed(Method::POST, &format!("/orgs/{org_id}/projects"), session)
                .json(project),
        )
        .await
    }

    async fn list_workers(&self, session: &Session, org_id: &str) -> BackendResult<Vec<Worker>> {
        self.fetch(
            self.authed(Method::GET, "/workers", session)
                .query(&[("orgId", org_id)]),
        )
        .await
    }

    async fn create_worker(&self, session: &Session, worker: &CreateWorker) -> BackendResult<Worker> {
        self.fetch(self.authed(Method::POST, "/workers", session).json(worker))
            .await
    }

    async fn list_sheets(&self, session: &Session, project_id: &str) -> BackendResult<Vec<SheetMeta>> {
        self.fetch(self.authed(
            Method::GET,
            &format!("/attendances/tender/{project_id}"),
            session,
        ))
        .await
    }

    async fn create_sheet(&self, session: &Session, sheet: &CreateSheetUpstream) -> BackendResult<SheetMeta> {
        self.fetch(self.authed(Method::POST, "/attendances/", session).json(sheet))
            .await
    }

    async fn attendance(
        &self,
        session: &Session,
        project_id: &str,
        month: MonthKey,
    ) -> BackendResult<AttendanceData> {
        self.fetch(self.authed(
            Method::GET,
            &format!("/attendances/tender/{project_id}/{month}"),
            session,
        ))
        .await
    }

    async fn save_attendance(
        &self,
        session: &Session,
        sheet_id: &str,
        bulk: &BulkAttendance,
    ) -> BackendResult<()> {
        self.send(
            self.authed(Method::POST, &format!("/attendances/{sheet_id}/bulk"), session)
                .json(bulk),
        )
        .await
        .map(|_| ())
    }

    async fn remove_sheet_worker(&self, session: &Session, sheet_id: &str, worker_id: &str) -> BackendResult<()> {
        self.send(self.authed(
            Method::DELETE,
            &format!("/attendances/{sheet_id}/workers/{worker_id}"),
            session,
        ))
        .await
        .map(|_| ())
    }

    async fn change_sheet_worker(
        &self,
        session: &Session,
        sheet_id: &str,
        worker_id: &str,
        new_worker_id: &str,
    ) -> BackendResult<()> {
        let body = ChangeSheetWorker {
            new_worker_id: new_worker_id.to_string(),
        };
        self.send(
            self.authed(
                Method::PUT,
                &format!("/attendances/{sheet_id}/workers/{worker_id}"),
                session,
            )
            .json(&body),
        )
        .await
        .map(|_| ())
    }

    async fn process_payment(
        &self,
        session: &Session,
        event_name: &str,
        sheet_id: &str,
    ) -> BackendResult<ProcessResponse> {
        let body = ProcessPaymentRequest {
            event_name: event_name.to_string(),
            sheet_id: sheet_id.to_string(),
        };
        self.fetch(self.authed(Method::POST, "/external/process", session).json(&body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use actix_web::dev::ServerHandle;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
    use serde_json::json;

    use super::*;

    fn session() -> Session {
        Session {
            token: "t-1".to_string(),
            org_id: Some("org-gs".to_string()),
        }
    }

    async fn organization(req: HttpRequest, path: web::Path<String>) -> HttpResponse {
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok());
        if bearer != Some("Bearer t-1") {
            return HttpResponse::Unauthorized().finish();
        }
        match path.as_str() {
            "org-gs" => HttpResponse::Ok().json(json!({"id": "org-gs", "name": "M/S G.S. CONSTRUCTION"})),
            "locked" => HttpResponse::Forbidden().finish(),
            _ => HttpResponse::Ok().content_type("application/json").body("{\"id\": 42"),
        }
    }

    /// Upstream stand-in on an ephemeral port; stop it through the handle.
    fn upstream() -> (HttpBackend, ServerHandle) {
        let server = HttpServer::new(|| {
            App::new()
                .route("/orgs/{org_id}", web::get().to(organization))
                .route(
                    "/orgs/{org_id}/projects/{project_id}",
                    web::get().to(|| async { HttpResponse::NotFound().body("Project p-9") }),
                )
                .route(
                    "/workers",
                    web::get().to(|| async { HttpResponse::InternalServerError().body("boom") }),
                )
                .route(
                    "/attendances/{sheet_id}/workers/{worker_id}",
                    web::delete().to(|| async { HttpResponse::NoContent().finish() }),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (HttpBackend::new(&format!("http://{addr}/")), handle)
    }

    #[actix_web::test]
    async fn decodes_a_successful_response() {
        let (backend, server) = upstream();
        let org = backend.organization(&session(), "org-gs").await.unwrap();
        assert_eq!(org.name, "M/S G.S. CONSTRUCTION");
        assert!(org.available_roles.is_empty());

        backend
            .remove_sheet_worker(&session(), "sheet-1", "w-1")
            .await
            .unwrap();
        server.stop(false).await;
    }

    #[actix_web::test]
    async fn rejected_sessions_are_unauthorized() {
        let (backend, server) = upstream();
        let stranger = Session {
            token: "other".to_string(),
            org_id: None,
        };
        let err = backend.organization(&stranger, "org-gs").await.unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = backend.organization(&session(), "locked").await.unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized));
        server.stop(false).await;
    }

    #[actix_web::test]
    async fn not_found_keeps_the_upstream_body() {
        let (backend, server) = upstream();
        let err = backend.project(&session(), "org-gs", "p-9").await.unwrap_err();
        assert!(matches!(&err, BackendError::NotFound(body) if body == "Project p-9"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        server.stop(false).await;
    }

    #[actix_web::test]
    async fn other_statuses_become_bad_gateway() {
        let (backend, server) = upstream();
        let err = backend.list_workers(&session(), "org-gs").await.unwrap_err();
        assert!(matches!(&err, BackendError::Status { status: 500, body } if body == "boom"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        server.stop(false).await;
    }

    #[actix_web::test]
    async fn unreadable_body_is_a_decode_error() {
        let (backend, server) = upstream();
        let err = backend.organization(&session(), "garbled").await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        server.stop(false).await;
    }

    #[actix_web::test]
    async fn unreachable_backend_is_a_transport_error() {
        let (backend, server) = upstream();
        server.stop(false).await;
        let err = backend.organization(&session(), "org-gs").await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
