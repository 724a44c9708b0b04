use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginReqDto {
    #[schema(example = "site.manager@gsconstruction.in")]
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
}

/// Sign-in body expected by the upstream backend.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
    pub token_type: String,
}

impl From<&LoginReqDto> for SignInRequest {
    fn from(req: &LoginReqDto) -> Self {
        SignInRequest {
            username_or_email: req.username.trim().to_string(),
            password: req.password.clone(),
        }
    }
}

impl From<SignInResponse> for LoginResponse {
    fn from(resp: SignInResponse) -> Self {
        LoginResponse {
            access_token: resp.access_token,
            token_type: resp.token_type,
        }
    }
}
