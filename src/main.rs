use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;
use std::io;
use std::sync::{Arc, RwLock};

mod api;
mod calc;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::api::dashboard::KpiCache;
use crate::docs::ApiDoc;
use crate::utils::identity_cache;
use crate::utils::identity_filter;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    let config = Config::from_env().map_err(|e| io::Error::other(format!("{e:#}")))?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, prefix = %config.api_prefix, "Server starting...");

    let pool = init_db(&config.database_url).await.map_err(|e| {
        error!(error = %e, "Failed to connect to database");
        io::Error::other(e)
    })?;

    let limiter = Arc::new(routes::build_limiter(config.rate_api_per_min).map_err(io::Error::other)?);

    let pool_for_filter_warmup = pool.clone();
    let pool_for_cache_warmup = pool.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = identity_filter::warmup_identity_filter(&pool_for_filter_warmup, 500).await {
            error!(error = %e, "Failed to warm up identity filter");
        }
    });

    actix_web::rt::spawn(async move {
        // Hires from the last 90 days, in batches of 250
        if let Err(e) = identity_cache::warmup_identity_cache(&pool_for_cache_warmup, 90, 250).await
        {
            error!(error = %e, "Failed to warm up identity cache");
        }
    });

    // Shared across workers: one payroll config, one KPI cache.
    let payroll_config = Data::new(RwLock::new(config.payroll.clone()));
    let kpi_cache = Data::new(KpiCache::new(config.kpi_cache_ttl_secs));
    let pool_data = Data::new(pool);
    let api_prefix = config.api_prefix.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard {_:.*} so the UI's JS/CSS assets resolve
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(pool_data.clone())
            .app_data(payroll_config.clone())
            .app_data(kpi_cache.clone())
            .configure(|cfg| routes::configure(cfg, &api_prefix, limiter.clone()))
    })
    .bind(&config.server_addr)?
    .run()
    .await
}
