//! Middleware - authentication extractors and error mapping.

pub mod auth;
pub mod error;

pub use auth::{Identity, OptionalIdentity};
pub use error::{AppError, AppResult};
