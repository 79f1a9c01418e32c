//! Utility functions for the Pulse dashboard core.
//!
//! This module is organized into focused submodules:
//!
//! - [`validation`] - Record validation constants and normalization
//! - [`format`] - Display formatting (currency, compact figures, relative time)

mod format;
mod validation;

// ============================================
// Re-exports
// ============================================

// Formatting utilities
pub use format::{format_change, format_number, format_time_ago, NumberStyle};

// Validation utilities
pub use validation::{
    clamp_migration_progress, normalize_token, validate_usd_amount, validate_usd_price,
    MAX_TOKEN_USD_PRICE, MIGRATION_COMPLETE,
};
