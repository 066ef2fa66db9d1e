mod config;
mod error;
mod handlers;
mod messages;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod state;
mod utils;

use crate::config::{Config, DatabaseConfig};
use crate::middleware::{create_cors, RequestLogging};
use crate::routes::{category_routes, extractor_config, payment_routes, product_routes, public_routes};
use crate::state::AppState;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use chrono::Local;
use log::{info, warn};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::io;
use std::io::Write;
use std::time::Duration;

/// 初始化日志
fn init_logger() {
    let mut log_builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    log_builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S %:z"),
                record.level(),
                record.args()
            )
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e)) // 转换为 io::Result
        })
        .init();
}

/// 创建数据库连接池并执行迁移
async fn create_pool(database: &DatabaseConfig, url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .min_connections(database.min_connections)
        .acquire_timeout(Duration::from_secs(database.connect_timeout))
        .idle_timeout(Duration::from_secs(database.idle_timeout))
        .connect(url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    let db_pool = match &config.database.url {
        Some(url) => Some(create_pool(&config.database, url).await?),
        None => {
            warn!("DATABASE_URL not set, using in-memory storage with demo data");
            None
        }
    };

    let bind_address = config.bind_address();
    let workers = config.server.workers;
    let cors_origins = config.web.cors_allowed_origins.clone();

    let app_state = web::Data::new(AppState::new(config, db_pool)?);
    info!(
        "Starting server on {} (storage: {})",
        bind_address,
        app_state.storage_backend()
    );

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(extractor_config)
            .wrap(create_cors(&cors_origins))
            .wrap(RequestLogging)
            .service(product_routes())
            .service(category_routes())
            .service(payment_routes())
            .service(public_routes())
    });

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    server.bind(&bind_address)?.run().await?;

    info!("Server stopped");
    Ok(())
}
