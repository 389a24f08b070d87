use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed identifier of the singleton settings row.
pub const SETTINGS_ID: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000001);

/// Blog-wide configuration. Exactly one row exists, keyed by [`SETTINGS_ID`];
/// it is materialized with defaults on first read and replaced wholesale on
/// every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogSettings {
    pub id: Uuid,
    pub blog_title: String,
    pub blog_tagline: Option<String>,
    pub blog_description: Option<String>,
    pub posts_per_page: i32,
    pub allow_comments: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID,
            blog_title: "My Blog".to_string(),
            blog_tagline: None,
            blog_description: None,
            posts_per_page: 10,
            allow_comments: true,
            updated_by: None,
            updated_at: Utc::now(),
        }
    }
}
