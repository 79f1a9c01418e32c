//! Periodic real-time price updates.

pub mod jobs;
pub mod scheduler;

pub use scheduler::UpdateScheduler;
