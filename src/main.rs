use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod jobs;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::jobs::attendance_reset;
use crate::store::memory::{MemoryStore, Seed};
use crate::store::mysql::MySqlStore;
use crate::store::SharedStore;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa_swagger_ui::SwaggerUi;

/// `memory://` or `memory://<seed.json>` selects the in-memory store.
const MEMORY_SCHEME: &str = "memory://";

#[get("/")]
async fn index() -> impl Responder {
    "HRM payroll service"
}

async fn open_store(database_url: &str) -> anyhow::Result<SharedStore> {
    if let Some(seed_path) = database_url.strip_prefix(MEMORY_SCHEME) {
        warn!("Using in-memory store; data is lost on restart");
        if seed_path.is_empty() {
            return Ok(Arc::new(MemoryStore::new()));
        }

        let raw = std::fs::read_to_string(seed_path)
            .with_context(|| format!("Failed to read seed file {seed_path}"))?;
        let seed: Seed = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid seed file {seed_path}"))?;
        info!(
            employees = seed.employees.len(),
            leaves = seed.leaves.len(),
            "Seeded in-memory store"
        );
        return Ok(Arc::new(MemoryStore::from_seed(seed)));
    }

    let pool = init_db(database_url).await?;
    Ok(Arc::new(MySqlStore::new(pool)))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
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

    info!("Server starting...");

    let store = open_store(&config.database_url).await?;

    if config.reset_job_enabled {
        attendance_reset::spawn_scheduler(store.clone(), config.reset_job_at);
    } else {
        warn!("Daily attendance reset job is disabled");
    }

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let openapi = docs::openapi_for(&config.api_prefix);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", openapi.clone()),
            )
            .app_data(Data::from(store.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            // Protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
