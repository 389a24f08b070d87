//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use background::{Scheduler, register_sweep};
use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::init_telemetry;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_telemetry(&config.telemetry);

    tracing::info!(
        "Starting Quill API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await?;

    // Background sweep for due scheduled posts
    let mut scheduler = None;
    if config.sweeper.enabled {
        let s = Scheduler::new()
            .await
            .map_err(|e| anyhow::anyhow!("scheduler init failed: {e}"))?;
        register_sweep(&s, state.posts.clone(), &config.sweeper.cron)
            .await
            .map_err(|e| anyhow::anyhow!("sweep registration failed: {e}"))?;
        s.start()
            .await
            .map_err(|e| anyhow::anyhow!("scheduler start failed: {e}"))?;
        scheduler = Some(s);
    } else {
        tracing::info!("Sweeper disabled");
    }

    let app_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(app_state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    if let Some(mut s) = scheduler.take() {
        if let Err(e) = s.shutdown().await {
            tracing::warn!(error = %e, "Scheduler shutdown failed");
        }
    }

    Ok(())
}
