//! Background jobs - the scheduled-publish sweeper.

mod scheduler;

pub use scheduler::{Scheduler, register_sweep};
