mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::services::catalog_service::CatalogService;
use crate::services::notification_service::Notifier;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("crowdfund_backend=debug,actix_web=info")),
        )
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    tracing::info!("🔌 Connecting to database...");
    let db = db::establish_connection(&config)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to connect to database: {}", e)))?;
    tracing::info!("✅ Database connected!");

    if config.sync_schema {
        db::create_schema(&db)
            .await
            .map_err(|e| std::io::Error::other(format!("Failed to create schema: {}", e)))?;
        tracing::info!("schema synchronized");
    }

    if config.seed_categories {
        CatalogService::seed_default_categories(&db)
            .await
            .map_err(|e| std::io::Error::other(format!("Failed to seed categories: {}", e)))?;
    }

    let notifier = web::Data::new(Notifier::from_config(&config));
    let bind = config.bind_address();
    let config = web::Data::new(config);
    let db = web::Data::new(db);

    tracing::info!("🚀 Starting server on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(notifier.clone())
            .configure(routes::configure_routes)
    })
        .bind(bind)?
        .run()
        .await
}
