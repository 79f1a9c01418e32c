pub mod config;
pub mod cron;
pub mod dashboard;
pub mod feed;
pub mod models;
pub mod store;
pub mod utils;

pub use config::Settings;
pub use cron::UpdateScheduler;
pub use dashboard::{Dashboard, DashboardHandle, Intent};
pub use feed::{FetchError, MockTokenSource, TokenSource};
pub use models::{Category, Token};
pub use store::{project, MarketSummary, NotificationQueue, StoreSnapshot, TokenStore};
