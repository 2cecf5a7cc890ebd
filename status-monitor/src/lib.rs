//! status-monitor library crate.
//!
//! Polls a status-page summary endpoint, detects component status changes
//! between successive readings and relays them to a chat webhook.

pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notification;
pub mod scheduler;
pub mod utils;

pub use config::AppConfig;
pub use error::{ConfigError, Error, FetchError, NotifyError, Result};
