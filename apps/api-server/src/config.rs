//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use quill_core::service::CreationPolicy;
use quill_infra::database::DatabaseConfig;
use quill_infra::tags::TagServiceConfig;
use uuid::Uuid;

use crate::telemetry::TelemetryConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt_secret: String,
    pub tag_service: TagServiceConfig,
    pub sweeper: SweeperConfig,
    pub creation: CreationPolicy,
    pub telemetry: TelemetryConfig,
}

/// Scheduled-publish sweeper configuration.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub enabled: bool,
    /// Six-field cron expression (seconds first). Default: once a minute.
    pub cron: String,
}

impl SweeperConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("SWEEPER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            cron: env::var("SWEEPER_CRON").unwrap_or_else(|_| "0 * * * * *".to_string()),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `DATABASE_URL` and `JWT_SECRET` are required; the server refuses
    /// to start without them rather than degrading to a partial mode.
    pub fn from_env() -> anyhow::Result<Self> {
        let database = DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        };

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let tag_service = TagServiceConfig {
            base_url: env::var("TAG_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            timeout: env::var("TAG_SERVICE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(5)),
        };

        let creation = CreationPolicy {
            allow_unauthenticated: env::var("ALLOW_UNAUTHENTICATED_CREATE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            fallback_author: env::var("FALLBACK_AUTHOR_ID")
                .ok()
                .and_then(|s| s.parse::<Uuid>().ok())
                .unwrap_or_else(Uuid::nil),
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database,
            jwt_secret,
            tag_service,
            sweeper: SweeperConfig::from_env(),
            creation,
            telemetry: TelemetryConfig::from_env(),
        })
    }
}
