use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod engine;
mod error;
mod model;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;
use service::liquidation_service::LiquidationService;
use service::payroll_service::PayrollService;
use store::PayrollStore;
use store::cached::CachedStore;
use store::mysql::MySqlStore;
use utils::cache::LookupCache;

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    // refuse to start on a bad salary config
    let salary_config = config.salary_config()?;
    info!(
        overtime_multiplier = %salary_config.overtime_multiplier,
        holiday_multiplier = %salary_config.holiday_multiplier,
        working_hours_per_day = salary_config.working_hours_per_day,
        working_days_per_month = salary_config.working_days_per_month,
        versioning = config.liquidation_versioning.as_ref(),
        "Server starting..."
    );

    let pool = init_db(&config.database_url).await?;

    let cache = LookupCache::new(config.cache_ttl, config.cache_max_capacity);
    let store: Arc<dyn PayrollStore> = Arc::new(CachedStore::new(MySqlStore::new(pool), cache));

    let payroll_service = Data::new(PayrollService::new(store.clone(), salary_config));
    let liquidation_service = Data::new(LiquidationService::new(
        store,
        config.liquidation_versioning,
    ));

    let server_addr = config.server_addr.clone();
    let openapi = ApiDoc::for_prefix(&config.api_prefix);
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", openapi.clone()),
            )
            .app_data(config_data.clone())
            .app_data(payroll_service.clone())
            .app_data(liquidation_service.clone())
            .service(health)
            // Payroll + liquidation routes behind auth and rate limiting
            .configure(|cfg| routes::configure(cfg, &config_data))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
