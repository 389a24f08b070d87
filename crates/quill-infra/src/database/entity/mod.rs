//! SeaORM entities for the blog schema.

pub mod blog_settings;
pub mod post;
pub mod post_category;
pub mod post_tag;
pub mod post_version;
pub mod post_view;
