use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

use crate::error::AppError;

/// Header carrying the organization the caller is working in.
pub const ORG_HEADER: &str = "X-Org-Id";

/// Caller identity, passed explicitly into every backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Upstream access token, forwarded as-is.
    pub token: String,
    pub org_id: Option<String>,
}

impl Session {
    pub fn from_request_headers(req: &HttpRequest) -> Result<Self, &'static str> {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or("Missing token")?;

        let org_id = req
            .headers()
            .get(ORG_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from);

        Ok(Session {
            token: token.to_string(),
            org_id,
        })
    }

    /// The selected organization, or the "no organization selected" error.
    pub fn require_org(&self) -> Result<&str, AppError> {
        self.org_id.as_deref().ok_or(AppError::NoOrganization)
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(session) = req.extensions().get::<Session>() {
            return ready(Ok(session.clone()));
        }

        ready(Session::from_request_headers(req).map_err(ErrorUnauthorized))
    }
}
