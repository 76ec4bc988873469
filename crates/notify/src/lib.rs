//! Push notifications for Digital FTE.
//!
//! Devices register their push token through the dashboard API. When the
//! agent needs a decision (or has something to report), the dashboard hands a
//! [`PushEvent`] to the [`Notifier`], which fans it out to every active
//! subscription over each enabled channel.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use notify::{Notifier, PushEvent, SubscriptionRegistry};
//!
//! # async fn demo() {
//! let registry = Arc::new(SubscriptionRegistry::load("subscriptions.json").await);
//! let notifier = Notifier::from_env(registry);
//!
//! // Fire-and-forget
//! notifier.notify(PushEvent::test());
//! # }
//! ```
//!
//! # Configuration
//!
//! - `FCM_SERVER_KEY`: enables the FCM channel
//! - `FCM_ENDPOINT`: overrides the FCM send URL
//! - `NOTIFY_DISABLED`: set to "true" to disable all pushes
//!
//! Without an FCM key the [`LogChannel`] is used, so pushes show up in the
//! service log.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;
pub mod subscriptions;

pub use channels::fcm::FcmChannel;
pub use channels::log::LogChannel;
pub use channels::PushChannel;
pub use error::ChannelError;
pub use events::{Category, PushEvent};
pub use subscriptions::{Platform, Subscription, SubscriptionCounts, SubscriptionRegistry};

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Environment variable to disable all notifications.
const ENV_NOTIFY_DISABLED: &str = "NOTIFY_DISABLED";

/// Outcome of a synchronous fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    /// Tokens deactivated because the push service rejected them
    pub removed: usize,
}

/// Central push dispatcher.
pub struct Notifier {
    registry: Arc<SubscriptionRegistry>,
    channels: Vec<Arc<dyn PushChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Create a notifier from environment variables.
    #[must_use]
    pub fn from_env(registry: Arc<SubscriptionRegistry>) -> Self {
        let disabled = std::env::var(ENV_NOTIFY_DISABLED)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        if disabled {
            info!("Notifications disabled via NOTIFY_DISABLED");
            return Self {
                registry,
                channels: vec![],
                disabled: true,
            };
        }

        let fcm = FcmChannel::from_env();
        let channel: Arc<dyn PushChannel> = if fcm.enabled() {
            info!("FCM push notifications enabled");
            Arc::new(fcm)
        } else {
            warn!("FCM_SERVER_KEY not set, pushes will only be logged");
            Arc::new(LogChannel)
        };

        Self {
            registry,
            channels: vec![channel],
            disabled: false,
        }
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(
        registry: Arc<SubscriptionRegistry>,
        channels: Vec<Arc<dyn PushChannel>>,
    ) -> Self {
        Self {
            registry,
            channels,
            disabled: false,
        }
    }

    /// A notifier that never sends.
    #[must_use]
    pub fn disabled(registry: Arc<SubscriptionRegistry>) -> Self {
        Self {
            registry,
            channels: vec![],
            disabled: true,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.disabled && self.channels.iter().any(|c| c.enabled())
    }

    /// Names of the enabled channels.
    #[must_use]
    pub fn channel_names(&self) -> Vec<&'static str> {
        if self.disabled {
            return vec![];
        }
        self.channels
            .iter()
            .filter(|c| c.enabled())
            .map(|c| c.name())
            .collect()
    }

    /// Send to every active device in the background.
    ///
    /// Errors are logged, never returned.
    pub fn notify(&self, event: PushEvent) {
        if self.disabled {
            debug!("Notifications disabled, skipping event");
            return;
        }

        let registry = Arc::clone(&self.registry);
        let channels = self.channels.clone();
        tokio::spawn(async move {
            let report = deliver(&registry, &channels, &event).await;
            debug!(sent = report.sent, failed = report.failed, "Background push finished");
        });
    }

    /// Send to every active device and wait for the results.
    pub async fn notify_and_wait(&self, event: PushEvent) -> DeliveryReport {
        if self.disabled {
            return DeliveryReport::default();
        }
        deliver(&self.registry, &self.channels, &event).await
    }
}

async fn deliver(
    registry: &SubscriptionRegistry,
    channels: &[Arc<dyn PushChannel>],
    event: &PushEvent,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    let devices = registry.active().await;
    if devices.is_empty() {
        debug!("No active push subscriptions");
        return report;
    }

    for device in &devices {
        for channel in channels.iter().filter(|c| c.enabled()) {
            match channel.send(&device.token, event).await {
                Ok(()) => report.sent += 1,
                Err(ChannelError::InvalidToken(reason)) => {
                    report.failed += 1;
                    warn!(device = %device.device_name, reason = %reason, "Push token rejected, deactivating");
                    match registry.unregister(&device.token).await {
                        Ok(_) => report.removed += 1,
                        Err(e) => error!(error = %e, "Failed to deactivate push token"),
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        channel = channel.name(),
                        device = %device.device_name,
                        error = %e,
                        "Failed to send push notification"
                    );
                }
            }
        }
    }

    info!(
        sent = report.sent,
        failed = report.failed,
        category = ?event.category(),
        "Push notification dispatched"
    );
    report
}
