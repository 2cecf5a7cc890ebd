//! Notification system module.
//!
//! Renders detection results into webhook payloads and delivers them.
//!
//! # Example
//!
//! ```ignore
//! use status_monitor::notification::{MessageFormatter, PayloadFormat, EmojiStyle, WebhookChannel};
//!
//! let formatter = MessageFormatter::new(PayloadFormat::Card, EmojiStyle::Detailed, false);
//! for payload in formatter.format_cycle(&snapshot, &detection) {
//!     channel.send(&payload).await?;
//! }
//! ```

pub mod channels;
pub mod formatter;

pub use channels::{NotificationChannel, WebhookChannel};
pub use formatter::{
    EmojiStyle, MessageFormatter, NotificationKind, NotificationPayload, PayloadFormat,
};
