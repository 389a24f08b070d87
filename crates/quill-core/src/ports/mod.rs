//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod clock;
mod repository;
mod tags;

pub use clock::{Clock, SystemClock};
pub use repository::{
    CreatePost, Page, PostQuery, PostRepository, PostSort, SettingsRepository, SortDirection,
    VersionRepository, ViewRepository, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use tags::{TagValidationError, TagValidator};
