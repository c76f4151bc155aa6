pub mod delivery;
pub mod event;
pub mod notification;

pub use delivery::{ChannelKind, DeliveryRecord, DeliveryStatus};
pub use event::{EmergencyEvent, EmergencyType, Location, UserId};
pub use notification::{NewNotification, Notification, NotificationType, ReportStatus};
