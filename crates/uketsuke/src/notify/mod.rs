//! Notification channels.
//!
//! Channels are best-effort: the reception service builds one
//! [`NotificationMessage`] per lifecycle transition, offers it to every
//! configured channel, and logs failures without surfacing them. The
//! implementations here are stubs that assemble real payloads and log
//! them instead of delivering.

pub mod email;
pub mod message;
pub mod teams;

pub use email::EmailNotifier;
pub use message::{Fact, NotificationKind, NotificationMessage};
pub use teams::TeamsNotifier;

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Outcome of a successful delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Channel that handled the message.
    pub channel: &'static str,
    /// Identifier assigned by the channel.
    pub message_id: String,
}

/// A recorded delivery attempt, kept for desk-side lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    /// When the attempt was made.
    pub at: DateTime<Utc>,
    /// What the message was about.
    pub kind: NotificationKind,
    /// Recipient address.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Registration the message concerned.
    pub registration_id: Option<String>,
    /// Failure detail, absent on success.
    pub error: Option<String>,
}

impl DeliveryRecord {
    /// Whether the attempt went through.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// A notification channel.
///
/// Implementations must not block or fail the mutation that produced the
/// message; the caller records the outcome and moves on.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Channel name used in logs.
    fn name(&self) -> &'static str;

    /// Deliver a message through this channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Delivery`](crate::Error::Delivery) when the channel
    /// rejects the message.
    async fn send(&self, message: &NotificationMessage) -> Result<DeliveryReceipt>;
}
