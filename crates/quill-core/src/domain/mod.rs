//! Domain entities - the core business objects.

mod actor;
mod post;
mod settings;
mod version;
mod view;

pub use actor::{Actor, Role};
pub use post::{
    Field, NewPost, Post, PostStatus, PostSummary, PostUpdate, PostWithRelations,
    MAX_SLUG_LEN, MAX_TITLE_LEN,
};
pub use settings::{BlogSettings, SETTINGS_ID};
pub use version::PostVersion;
pub use view::PostView;
