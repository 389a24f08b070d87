use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Failures reported by the external tag/category service.
///
/// Any of these rejects the enclosing write: a tag-set replacement is
/// all-or-nothing, and an unreachable validator fails the write fast
/// rather than committing unvalidated associations.
#[derive(Debug, Clone, Error)]
pub enum TagValidationError {
    #[error("malformed tag identifier: {0}")]
    Malformed(String),

    #[error("tag not found: {0}")]
    NotFound(Uuid),

    #[error("tag is inactive: {0}")]
    Inactive(Uuid),

    #[error("tag service unreachable: {0}")]
    Unreachable(String),

    #[error("tag service timed out")]
    Timeout,
}

/// Capability consumed from the external category service: confirm that a
/// set of tag identifiers exists and is active. Called synchronously before
/// a tag-set replacement is committed; must carry a bounded timeout.
#[async_trait]
pub trait TagValidator: Send + Sync {
    async fn validate(&self, tag_ids: &[Uuid]) -> Result<(), TagValidationError>;
}
