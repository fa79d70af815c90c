use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::{CollectionApi, HttpApi};
use crate::config::AppConfig;

use super::events::{AppEvent, Notification, NotificationLevel};

/// Centralized handle to backend services.
///
/// Created once at startup, then passed by ref to views. The API client is
/// behind `Arc<dyn CollectionApi>` so spawned tasks can hold a clone and
/// tests can substitute a scripted implementation.
pub struct Services {
    pub api: Arc<dyn CollectionApi>,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Services {
    /// Initialize all services from config.
    ///
    /// Failures here are fatal: the console cannot run without a backend
    /// client, and a malformed base URL should abort before the terminal
    /// is put into raw mode.
    pub fn init(
        config: &AppConfig,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> anyhow::Result<Self> {
        let api = HttpApi::new(
            &config.api.base_url,
            config.api.api_key.clone(),
            config.timeout(),
        )?;
        log::info!("API client initialized for {}", config.api.base_url);

        Ok(Self {
            api: Arc::new(api),
            event_tx,
        })
    }

    /// Build directly from a client, for tests and alternate transports.
    pub fn with_api(api: Arc<dyn CollectionApi>, event_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { api, event_tx }
    }

    /// Queue a notification for the overlay. The id is assigned by the app
    /// when the event is drained.
    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        let _ = self.event_tx.send(AppEvent::Notification(Notification {
            id: 0,
            message: message.into(),
            level,
            ttl_ticks: 100,
        }));
    }
}
