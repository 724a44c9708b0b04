use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::model::sheet::MonthKey;
use crate::sheet::attendance::DayOutOfRange;
use crate::sheet::date_range::DateParseError;
use crate::sheet::payment::InvalidAmount;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No organization selected")]
    NoOrganization,

    #[error("No attendance sheet for project {project_id} in {month}")]
    SheetNotFound { project_id: String, month: MonthKey },

    #[error("Sheet {month} of project {project_id} is not open in this session, load it first")]
    SheetNotLoaded { project_id: String, month: MonthKey },

    #[error("Worker {0} not found")]
    WorkerNotFound(String),

    #[error("Worker {0} is already on this sheet")]
    WorkerAlreadyOnSheet(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Sheet has malformed dates: {0}")]
    MalformedSheet(#[from] DateParseError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<DayOutOfRange> for AppError {
    fn from(e: DayOutOfRange) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<InvalidAmount> for AppError {
    fn from(e: InvalidAmount) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoOrganization | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::SheetNotFound { .. } | AppError::WorkerNotFound(_) => StatusCode::NOT_FOUND,
            AppError::SheetNotLoaded { .. } | AppError::WorkerAlreadyOnSheet(_) => {
                StatusCode::CONFLICT
            }
            AppError::MalformedSheet(_) => StatusCode::BAD_GATEWAY,
            AppError::Backend(e) => e.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}
