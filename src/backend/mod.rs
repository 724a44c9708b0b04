//! The upstream workforce backend.
//!
//! Handlers only ever talk to [`Backend`]; which implementation sits behind
//! it is decided once at startup from `BACKEND_MODE`.

pub mod fixture;
pub mod http;

use actix_web::http::StatusCode;
use async_trait::async_trait;
use thiserror::Error;

use crate::auth::session::Session;
use crate::model::attendance::{AttendanceData, BulkAttendance, ProcessResponse};
use crate::model::organization::{Organization, UserProfile};
use crate::model::project::{CreateProject, Project, ProjectStatus};
use crate::model::sheet::{CreateSheetUpstream, MonthKey, SheetMeta};
use crate::model::worker::{CreateWorker, Worker};
use crate::models::{SignInRequest, SignInResponse};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend rejected the session")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
            BackendError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait Backend: Send + Sync {
    async fn sign_in(&self, credentials: &SignInRequest) -> BackendResult<SignInResponse>;

    async fn current_user(&self, session: &Session) -> BackendResult<UserProfile>;

    async fn organization(&self, session: &Session, org_id: &str) -> BackendResult<Organization>;

    async fn list_projects(
        &self,
        session: &Session,
        org_id: &str,
        status: Option<ProjectStatus>,
    ) -> BackendResult<Vec<Project>>;

    async fn project(&self, session: &Session, org_id: &str, project_id: &str) -> BackendResult<Project>;

    async fn create_project(
        &self,
        session: &Session,
        org_id: &str,
        project: &CreateProject,
    ) -> BackendResult<Project>;

    async fn list_workers(&self, session: &Session, org_id: &str) -> BackendResult<Vec<Worker>>;

    async fn create_worker(&self, session: &Session, worker: &CreateWorker) -> BackendResult<Worker>;

    async fn list_sheets(&self, session: &Session, project_id: &str) -> BackendResult<Vec<SheetMeta>>;

    async fn create_sheet(&self, session: &Session, sheet: &CreateSheetUpstream) -> BackendResult<SheetMeta>;

    async fn attendance(
        &self,
        session: &Session,
        project_id: &str,
        month: MonthKey,
    ) -> BackendResult<AttendanceData>;

    async fn save_attendance(
        &self,
        session: &Session,
        sheet_id: &str,
        bulk: &BulkAttendance,
    ) -> BackendResult<()>;

    async fn remove_sheet_worker(&self, session: &Session, sheet_id: &str, worker_id: &str) -> BackendResult<()>;

    async fn change_sheet_worker(
        &self,
        session: &Session,
        sheet_id: &str,
        worker_id: &str,
        new_worker_id: &str,
    ) -> BackendResult<()>;

    async fn process_payment(
        &self,
        session: &Session,
        event_name: &str,
        sheet_id: &str,
    ) -> BackendResult<ProcessResponse>;
}
