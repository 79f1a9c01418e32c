//! Dashboard state: the canonical token collection, its projection and the
//! notification queue.

pub mod notifications;
pub mod projection;
pub mod summary;
pub mod token_store;

pub use notifications::{NotificationQueue, DEFAULT_NOTIFICATION_CAP};
pub use projection::{
    compare_by, locale_compare, project, CategoryFilter, SortDirection, SortField, ViewParams,
};
pub use summary::{MarketSummary, Mover};
pub use token_store::{LoadTicket, StoreSnapshot, TokenStore};
