use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{Category, Token};
use crate::utils::{format_change, format_number, NumberStyle};

/// Symbol and 24h change of the biggest mover in either direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mover {
    pub symbol: String,
    pub change: f64,
}

/// Aggregate market figures over a token collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub total_volume: f64,
    pub total_market_cap: f64,
    pub active_tokens: usize,
    pub new_tokens_24h: usize,
    pub avg_change_24h: f64,
    pub top_gainer: Option<Mover>,
    pub top_loser: Option<Mover>,
    /// Tokens in the final stretch of their bonding curve
    pub migrations_pending: usize,
}

impl MarketSummary {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        Self::at(tokens, Utc::now())
    }

    /// Summary as of `now`, which decides what counts as created in the last 24h.
    pub fn at(tokens: &[Token], now: DateTime<Utc>) -> Self {
        if tokens.is_empty() {
            return Self::default();
        }

        let cutoff = now - Duration::hours(24);
        let mover = |token: &Token| Mover {
            symbol: token.symbol.clone(),
            change: token.price_change_24h,
        };

        // First record wins ties, matching the canonical order.
        let mut gainer = &tokens[0];
        let mut loser = &tokens[0];
        for token in &tokens[1..] {
            if token.price_change_24h > gainer.price_change_24h {
                gainer = token;
            }
            if token.price_change_24h < loser.price_change_24h {
                loser = token;
            }
        }

        Self {
            total_volume: tokens.iter().map(|t| t.volume_24h).sum(),
            total_market_cap: tokens.iter().map(|t| t.market_cap).sum(),
            active_tokens: tokens.len(),
            new_tokens_24h: tokens.iter().filter(|t| t.created_at >= cutoff).count(),
            avg_change_24h: tokens.iter().map(|t| t.price_change_24h).sum::<f64>()
                / tokens.len() as f64,
            top_gainer: Some(mover(gainer)),
            top_loser: Some(mover(loser)),
            migrations_pending: tokens
                .iter()
                .filter(|t| t.category == Category::FinalStretch)
                .count(),
        }
    }
}

impl fmt::Display for MarketSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vol {} | mcap {} | {} tokens ({} new) | avg {} | {} pending",
            format_number(self.total_volume, NumberStyle::COMPACT_CURRENCY),
            format_number(self.total_market_cap, NumberStyle::COMPACT_CURRENCY),
            self.active_tokens,
            self.new_tokens_24h,
            format_change(self.avg_change_24h),
            self.migrations_pending
        )?;

        if let Some(gainer) = &self.top_gainer {
            write!(f, " | top {} {}", gainer.symbol, format_change(gainer.change))?;
        }
        if let Some(loser) = &self.top_loser {
            write!(f, " | worst {} {}", loser.symbol, format_change(loser.change))?;
        }
        Ok(())
    }
}
