//! Notification channels.
//!
//! A channel delivers one rendered payload per call. Delivery failures are
//! returned to the caller, which logs them and moves on.

mod webhook;

pub use webhook::WebhookChannel;

use async_trait::async_trait;

use super::formatter::NotificationPayload;
use crate::error::NotifyError;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Send a notification through this channel.
    async fn send(&self, payload: &NotificationPayload) -> Result<(), NotifyError>;
}
