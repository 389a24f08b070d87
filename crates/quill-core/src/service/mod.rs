//! Application services - the post lifecycle manager and settings service.
//!
//! Services own the business rules (state machine guards, authorization,
//! versioning policy, temporal checks) and delegate storage to the ports,
//! so they can be tested with in-memory fakes and a controlled clock.

mod posts;
mod settings;

pub use posts::{CreationPolicy, EditPost, PostService};
pub use settings::{SettingsService, UpdateSettings};

#[cfg(test)]
mod tests;
