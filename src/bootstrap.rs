//! Wires the dispatch core from configuration.
//!
//! Every adapter receives the same explicitly constructed HTTP client and the
//! collaborators are injected as trait objects, so there is no process-wide
//! client state.

use std::sync::Arc;

use log::{info, warn};
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppResult;
use crate::services::{
    build_http_client, ChannelAdapter, DeliveryStore, DeliveryTracker, DeviceDirectory,
    DiscordNotifier, DispatchCoordinator, FacebookNotifier, MemoryDeliveryStore,
    MemoryDeviceDirectory, MemoryNotificationStore, NotificationGateway, NotificationStore,
    PgDeliveryStore, PgDeviceDirectory, PgNotificationStore, PushNotifier, TelegramNotifier,
};

/// Storage and collaborator backends
#[derive(Clone)]
pub struct Backends {
    pub deliveries: Arc<dyn DeliveryStore>,
    pub devices: Arc<dyn DeviceDirectory>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Backends {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            deliveries: Arc::new(PgDeliveryStore::new(pool.clone())),
            devices: Arc::new(PgDeviceDirectory::new(pool.clone())),
            notifications: Arc::new(PgNotificationStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            deliveries: Arc::new(MemoryDeliveryStore::new()),
            devices: Arc::new(MemoryDeviceDirectory::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
        }
    }
}

/// Fully wired services shared by the HTTP handlers
#[derive(Clone)]
pub struct Services {
    pub coordinator: DispatchCoordinator,
    pub gateway: NotificationGateway,
    pub tracker: DeliveryTracker,
    pub devices: Arc<dyn DeviceDirectory>,
    pub notifications: Arc<dyn NotificationStore>,
}

/// Builds adapters, tracker, coordinator and gateway
pub fn build_services(config: &Config, backends: Backends) -> AppResult<Services> {
    let client = build_http_client(config.dispatch.channel_timeout)?;

    if config.push.server_key.is_none() {
        warn!("FCM_SERVER_KEY not set, push deliveries will fail as not_configured");
    }
    log_social_channel("Facebook", config.facebook.is_some());
    log_social_channel("Telegram", config.telegram.is_some());
    log_social_channel("Discord", config.discord.is_some());

    let push: Arc<dyn ChannelAdapter> = Arc::new(PushNotifier::new(
        client.clone(),
        config.push.clone(),
        backends.devices.clone(),
    ));
    let social: Vec<Arc<dyn ChannelAdapter>> = vec![
        Arc::new(FacebookNotifier::new(client.clone(), config.facebook.clone())),
        Arc::new(TelegramNotifier::new(client.clone(), config.telegram.clone())),
        Arc::new(DiscordNotifier::new(client, config.discord.clone())),
    ];

    let tracker = DeliveryTracker::new(backends.deliveries.clone());
    let coordinator = DispatchCoordinator::new(
        push.clone(),
        social,
        tracker.clone(),
        backends.notifications.clone(),
        config.dispatch.channel_timeout,
    );
    let gateway = NotificationGateway::new(
        push,
        backends.notifications.clone(),
        config.dispatch.channel_timeout,
    );

    Ok(Services {
        coordinator,
        gateway,
        tracker,
        devices: backends.devices,
        notifications: backends.notifications,
    })
}

fn log_social_channel(name: &str, configured: bool) {
    if configured {
        info!("{} channel configured", name);
    } else {
        warn!("{} channel not configured, deliveries will fail as not_configured", name);
    }
}
