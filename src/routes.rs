use crate::{
    api::{attendance, organization, payroll, project, worker},
    auth::{handlers, middleware::session_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond((60_000 / requests_per_min as u64).max(1))
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(session_middleware))
            .wrap(protected_limiter)
            .configure(protected_routes),
    );
}

/// Everything behind the session check, relative to `API_PREFIX`.
pub fn protected_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/me").route(web::get().to(handlers::me)))
        .service(web::resource("/organization").route(web::get().to(organization::get_organization)))
        .service(web::resource("/dashboard").route(web::get().to(organization::dashboard)))
        .service(
            web::resource("/workers")
                .route(web::get().to(worker::list_workers))
                .route(web::post().to(worker::create_worker)),
        )
        .service(
            web::scope("/projects")
                // /projects
                .service(
                    web::resource("")
                        .route(web::get().to(project::list_projects))
                        .route(web::post().to(project::create_project)),
                )
                // /projects/{project_id}
                .service(web::resource("/{project_id}").route(web::get().to(project::get_project)))
                // /projects/{project_id}/sheets
                .service(
                    web::resource("/{project_id}/sheets")
                        .route(web::get().to(attendance::list_sheets))
                        .route(web::post().to(attendance::create_sheet)),
                )
                .service(
                    web::scope("/{project_id}/sheets/{month}")
                        .service(web::resource("").route(web::get().to(attendance::load_sheet)))
                        .service(web::resource("/marks").route(web::put().to(attendance::edit_mark)))
                        .service(web::resource("/save").route(web::post().to(attendance::save_sheet)))
                        .service(
                            web::resource("/workers").route(web::post().to(attendance::add_worker)),
                        )
                        .service(
                            web::resource("/workers/{worker_id}")
                                .route(web::put().to(attendance::change_worker))
                                .route(web::delete().to(attendance::remove_worker)),
                        ),
                )
                .service(
                    web::scope("/{project_id}/payments/{month}")
                        .service(web::resource("").route(web::get().to(payroll::load_payments)))
                        .service(
                            web::resource("/other-payment")
                                .route(web::put().to(payroll::set_other_payment)),
                        )
                        .service(
                            web::resource("/process").route(web::post().to(payroll::process_payment)),
                        ),
                ),
        );
}
