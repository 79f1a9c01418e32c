#[allow(clippy::module_inception)]
mod config;

pub use self::config::{MockSettings, NotificationSettings, Settings, UpdateSettings, ViewSettings};
