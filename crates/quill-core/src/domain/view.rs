use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only page view event. No deduplication: every hit counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub viewed_at: DateTime<Utc>,
}

impl PostView {
    pub fn new(
        post_id: Uuid,
        ip_address: Option<String>,
        user_agent: Option<String>,
        viewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            ip_address,
            user_agent,
            viewed_at,
        }
    }
}
