//! Channel that only logs. Used when no push credentials are configured.

use async_trait::async_trait;
use tracing::info;

use super::PushChannel;
use crate::error::ChannelError;
use crate::events::PushEvent;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

#[async_trait]
impl PushChannel for LogChannel {
    fn name(&self) -> &'static str {
        "log"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, token: &str, event: &PushEvent) -> Result<(), ChannelError> {
        let prefix: String = token.chars().take(12).collect();
        info!(
            token = %prefix,
            category = ?event.category(),
            title = %event.title(),
            "Push notification (log only)"
        );
        Ok(())
    }
}
