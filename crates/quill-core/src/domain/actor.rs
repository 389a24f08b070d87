use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Post;

/// Role of the requesting principal, as asserted by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Author,
    Reader,
}

impl Role {
    /// Collapse a token's role claims to the strongest recognized role.
    pub fn from_claims(roles: &[String]) -> Self {
        if roles.iter().any(|r| r == "admin") {
            Role::Admin
        } else if roles.iter().any(|r| r == "editor") {
            Role::Editor
        } else if roles.iter().any(|r| r == "author") {
            Role::Author
        } else {
            Role::Reader
        }
    }

    /// Admins and editors may act on any post.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Editor)
    }
}

/// The authenticated principal behind a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// Authorization rule applied uniformly to mutating and privileged
    /// reads: the post's author, or a privileged role.
    pub fn can_modify(&self, post: &Post) -> bool {
        self.id == post.author_id || self.role.is_privileged()
    }
}
