//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! PostgreSQL repositories via SeaORM, the networked tag validator,
//! and JWT token validation.

pub mod auth;
pub mod database;
pub mod tags;

pub use auth::{AuthError, JwtTokenService, TokenClaims};
pub use database::{
    DatabaseConfig, DatabaseConnections, PostgresPostRepository, PostgresSettingsRepository,
    PostgresVersionRepository, PostgresViewRepository,
};
pub use tags::{HttpTagValidator, TagServiceConfig};
