mod notification;
mod token;

pub use notification::{NewNotification, Notification, NotificationAction, NotificationKind};
pub use token::{Category, RiskLevel, Token};
