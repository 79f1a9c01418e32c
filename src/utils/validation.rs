//! Token record validation constants and helper functions.
//!
//! Records enter the canonical collection from a data source we do not
//! control (the synthetic generator today, a live feed later). These bounds
//! catch generator bugs and garbage payloads before they reach the view:
//!
//! 1. PRICE: a listing token costing more than $1M per unit is a feed error.
//!    Zero is allowed; freshly created pairs can trade at effectively nothing.
//!
//! 2. MIGRATION PROGRESS: a percentage, always within [0, 100]. A migrated
//!    token has by definition completed its bonding curve, so its progress
//!    must read 100.
//!
//! 3. MARKET FIGURES: volume, market cap, FDV and liquidity are non-negative
//!    and finite. Anything else is replaced with zero.

use crate::models::{Category, Token};

// ============================================
// Validation Constants
// ============================================

/// Maximum reasonable token price in USD.
pub const MAX_TOKEN_USD_PRICE: f64 = 1e6;

/// Migration progress of a token that has left the bonding curve.
pub const MIGRATION_COMPLETE: f64 = 100.0;

// ============================================
// Field Validation Helpers
// ============================================

/// Validate a USD price is within reasonable bounds.
/// Returns Some(price) if valid, None if invalid.
#[inline]
pub fn validate_usd_price(price: f64) -> Option<f64> {
    if price >= 0.0 && price.is_finite() && price <= MAX_TOKEN_USD_PRICE {
        Some(price)
    } else {
        None
    }
}

/// Validate a non-negative USD amount (volume, market cap, liquidity).
/// Returns the amount if valid, 0.0 if invalid.
#[inline]
pub fn validate_usd_amount(amount: f64) -> f64 {
    if amount >= 0.0 && amount.is_finite() {
        amount
    } else {
        0.0
    }
}

/// Clamp a migration progress percentage into [0, 100]. NaN becomes 0.
#[inline]
pub fn clamp_migration_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, MIGRATION_COMPLETE)
    }
}

// ============================================
// Record Normalization
// ============================================

/// Repair a record so it satisfies the collection invariants.
///
/// Returns true if any field had to be changed, so the caller can log it.
pub fn normalize_token(token: &mut Token) -> bool {
    let mut repaired = false;

    let price = validate_usd_price(token.price).unwrap_or(0.0);
    if price != token.price {
        token.price = price;
        repaired = true;
    }

    if !token.price_change_24h.is_finite() {
        token.price_change_24h = 0.0;
        repaired = true;
    }

    for amount in [
        &mut token.volume_24h,
        &mut token.market_cap,
        &mut token.fdv,
        &mut token.liquidity,
        &mut token.trading_volume,
    ] {
        let valid = validate_usd_amount(*amount);
        if valid != *amount {
            *amount = valid;
            repaired = true;
        }
    }

    let progress = if token.category == Category::Migrated {
        MIGRATION_COMPLETE
    } else {
        clamp_migration_progress(token.migration_progress)
    };
    if progress != token.migration_progress {
        token.migration_progress = progress;
        repaired = true;
    }

    repaired
}
