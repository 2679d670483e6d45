/// Presale Admin Server
///
/// Main server entry point. Handles:
/// - Command-line / environment configuration
/// - Lazy store connection setup
/// - HTTP server startup
use actix_web::web;
use anyhow::Context;
use presale_admin_server::{config::Config, db, server};
use std::fs;
use std::process;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let config = Config::from_args();

    log::info!("Starting Presale Admin Server");
    log::info!("Database: {:?}", config.database);
    log::info!("Bind address: {}", config.bind_addr());
    log::info!("Session token lifetime: {}s", config.token_ttl_seconds);
    if config.admin_password.is_none() {
        log::warn!("ADMIN_PASSWORD is not set; /api/init-admin will fail until it is");
    }

    // Write PID file if specified
    if let Some(pidfile) = &config.pidfile {
        fs::write(pidfile, process::id().to_string())
            .with_context(|| format!("Failed to write PID file {:?}", pidfile))?;
        log::info!("PID file written to: {:?}", pidfile);
    }

    // The store is dialed by the first request that needs it
    let pool = web::Data::new(db::create_pool(config.database.clone()));
    let server_config = web::Data::new(config.server_config());

    let bind_addr = config.bind_addr();
    log::info!("Starting HTTP server on {}", bind_addr);

    let http_server = server::create_http_server(pool, server_config, &bind_addr)
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    http_server.await?;

    Ok(())
}
