//! Scheduler module.
//!
//! Owns the previous snapshot and drives the fetch → detect → format →
//! notify → sleep loop until shutdown.

mod service;

pub use service::{CycleReport, Scheduler, SchedulerState};
