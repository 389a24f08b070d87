//! Networked tag validator.
//!
//! The category service exposes a validate endpoint; every outbound call
//! carries a bounded timeout so a hung validator fails the enclosing
//! write fast instead of blocking it.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use quill_core::ports::{TagValidationError, TagValidator};

/// Configuration for the tag/category service client.
#[derive(Debug, Clone)]
pub struct TagServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for TagServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Rejection body returned by the category service.
#[derive(Debug, Default, Deserialize)]
struct ValidateFailure {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    tag_id: Option<Uuid>,
    #[serde(default)]
    detail: Option<String>,
}

/// HTTP implementation of the [`TagValidator`] capability.
pub struct HttpTagValidator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTagValidator {
    pub fn new(config: &TagServiceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TagValidator for HttpTagValidator {
    async fn validate(&self, tag_ids: &[Uuid]) -> Result<(), TagValidationError> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        let url = format!("{}/tags/validate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "tag_ids": tag_ids }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TagValidationError::Timeout
                } else {
                    TagValidationError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let failure: ValidateFailure = response.json().await.unwrap_or_default();
        let tag_id = failure.tag_id.unwrap_or(Uuid::nil());
        let err = match failure.reason.as_str() {
            "malformed" => TagValidationError::Malformed(
                failure.detail.unwrap_or_else(|| tag_id.to_string()),
            ),
            "not_found" => TagValidationError::NotFound(tag_id),
            "inactive" => TagValidationError::Inactive(tag_id),
            _ => TagValidationError::Unreachable(format!(
                "tag service returned {status} without a recognized reason"
            )),
        };
        tracing::warn!(%url, %status, error = %err, "Tag validation rejected");
        Err(err)
    }
}
