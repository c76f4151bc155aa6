pub mod channels;
pub mod directory;
pub mod dispatch;
pub mod gateway;
pub mod memory;
pub mod notifications;
pub mod render;
pub mod tracker;

pub use channels::{
    build_http_client, ChannelAdapter, DeliveryOutcome, DiscordNotifier, Envelope,
    FacebookNotifier, MediaAttachment, MediaKind, PushNotifier, TelegramNotifier,
};
pub use directory::{DeviceDirectory, PgDeviceDirectory};
pub use dispatch::{ChannelResult, DispatchCoordinator, DispatchResult};
pub use gateway::NotificationGateway;
pub use memory::{MemoryDeliveryStore, MemoryDeviceDirectory, MemoryNotificationStore};
pub use notifications::{NotificationStore, PgNotificationStore};
pub use render::{render, RenderedMessage};
pub use tracker::{DeliveryStore, DeliveryTracker, PgDeliveryStore};
