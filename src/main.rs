use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod backend;
mod config;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod sheet;
mod utils;

use backend::Backend;
use backend::fixture::FixtureBackend;
use backend::http::HttpBackend;
use config::{BackendMode, Config};

use crate::docs::ApiDoc;
use crate::utils::draft_store::DraftStore;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

fn build_backend(config: &Config) -> anyhow::Result<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match config.backend_mode {
        BackendMode::Http => {
            let base_url = config
                .backend_base_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("BACKEND_BASE_URL is required in http mode"))?;
            info!(%base_url, "Using workforce backend");
            Arc::new(HttpBackend::new(base_url))
        }
        BackendMode::Fixture => {
            warn!("Using in-memory fixture backend, nothing is persisted");
            Arc::new(FixtureBackend::seeded_with_rates(config.rates))
        }
    };
    Ok(backend)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env().map_err(std::io::Error::other)?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(mode = %config.backend_mode, "Server starting...");

    let backend = build_backend(&config).map_err(std::io::Error::other)?;
    let drafts = Data::new(DraftStore::new(&config));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::from(backend.clone()))
            .app_data(drafts.clone())
            .app_data(Data::new(config.clone()))
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
