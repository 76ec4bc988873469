//! Push delivery channels.

pub mod fcm;
pub mod log;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::events::PushEvent;

/// Trait for push delivery backends (FCM, log-only, etc.).
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Deliver an event to one device token.
    async fn send(&self, token: &str, event: &PushEvent) -> Result<(), ChannelError>;
}
