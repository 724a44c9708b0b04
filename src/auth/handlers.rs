use actix_web::{HttpResponse, Responder, web};
use tracing::{info, instrument};

use crate::{
    auth::session::Session,
    backend::Backend,
    error::AppError,
    models::{LoginReqDto, LoginResponse, SignInRequest},
    utils::draft_store::DraftStore,
};

/// Sign in against the upstream backend and hand its token back.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 502, description = "Backend unavailable")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(user, backend), fields(username = %user.username))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    backend: web::Data<dyn Backend>,
) -> Result<HttpResponse, AppError> {
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(AppError::BadRequest(
            "Username or password required".to_string(),
        ));
    }

    let resp = backend.sign_in(&SignInRequest::from(&*user)).await?;

    info!("Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse::from(resp)))
}

/// Drop every open sheet of this session.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Session drafts discarded")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(session: Session, drafts: web::Data<DraftStore>) -> impl Responder {
    drafts.discard_session(&session.token).await;
    HttpResponse::NoContent().finish()
}

/// Profile of the signed-in user, with organization memberships.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = crate::model::organization::UserProfile),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    session: Session,
    backend: web::Data<dyn Backend>,
) -> Result<HttpResponse, AppError> {
    let profile = backend.current_user(&session).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::backend::fixture::{FIXTURE_TOKEN, FixtureBackend};
    use crate::config::Config;
    use actix_web::{App, test};
    use std::sync::Arc;

    #[actix_web::test]
    async fn login_returns_backend_token() {
        let backend: Arc<dyn Backend> = Arc::new(FixtureBackend::seeded());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(backend))
                .route("/auth/login", web::post().to(login)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"username": "manager", "password": "secret"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["accessToken"], FIXTURE_TOKEN);
        assert_eq!(body["tokenType"], "Bearer");
    }

    #[actix_web::test]
    async fn empty_credentials_are_rejected() {
        let backend: Arc<dyn Backend> = Arc::new(FixtureBackend::seeded());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(backend))
                .route("/auth/login", web::post().to(login)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"username": " ", "password": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn logout_discards_drafts() {
        let config = Config::for_tests();
        let drafts = web::Data::new(DraftStore::new(&config));
        let app = test::init_service(
            App::new()
                .app_data(drafts.clone())
                .route("/auth/logout", web::post().to(logout)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/logout")
            .insert_header(("Authorization", "Bearer t-1"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::NO_CONTENT);
    }
}
