//! Display formatting for prices, market figures and timestamps.
//!
//! Output matches what the dashboard table shows: US grouping, `$` prefix,
//! and compact `K`/`M`/`B` suffixes for large figures.

use chrono::{DateTime, Utc};

// ============================================
// Numbers
// ============================================

/// How [`format_number`] should render a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumberStyle {
    pub currency: bool,
    pub compact: bool,
}

impl NumberStyle {
    pub const PLAIN: NumberStyle = NumberStyle {
        currency: false,
        compact: false,
    };
    pub const CURRENCY: NumberStyle = NumberStyle {
        currency: true,
        compact: false,
    };
    pub const COMPACT: NumberStyle = NumberStyle {
        currency: false,
        compact: true,
    };
    pub const COMPACT_CURRENCY: NumberStyle = NumberStyle {
        currency: true,
        compact: true,
    };
}

/// Format a numeric value for display.
///
/// # Arguments
/// * `value` - The number to render
/// * `style` - Currency prefix and/or compact suffix
///
/// # Returns
/// * Compact: `$1.2B`, `$45.7M`, `3.4K` (one decimal) above 1,000
/// * Currency: `$1,234.56`, or six decimals below one cent (`$0.000412`)
/// * Plain: grouped with up to three fraction digits (`1,234.568`)
pub fn format_number(value: f64, style: NumberStyle) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let prefix = if style.currency { "$" } else { "" };

    if style.compact {
        if value >= 1e9 {
            return format!("{}{:.1}B", prefix, value / 1e9);
        }
        if value >= 1e6 {
            return format!("{}{:.1}M", prefix, value / 1e6);
        }
        if value >= 1e3 {
            return format!("{}{:.1}K", prefix, value / 1e3);
        }
    }

    if style.currency {
        let decimals = if value < 0.01 { 6 } else { 2 };
        let sign = if value < 0.0 { "-" } else { "" };
        let body = format!("{:.*}", decimals, value.abs());
        return format!("{}${}", sign, group_thousands(&body));
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let body = format!("{:.3}", value.abs());
    let body = body.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", sign, group_thousands(body))
}

/// Format a signed percentage change: `+12.34%`, `-0.50%`, `0.00%`.
pub fn format_change(change: f64) -> String {
    if change > 0.0 {
        format!("+{:.2}%", change)
    } else {
        format!("{:.2}%", change)
    }
}

/// Insert `,` separators into the integer part of a plain decimal string.
fn group_thousands(digits: &str) -> String {
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}.{}", grouped, frac),
        None => grouped,
    }
}

// ============================================
// Time
// ============================================

/// Relative age of a timestamp: `Just now`, `5m ago`, `3h ago`, `2d ago`.
///
/// Timestamps in the future count as "Just now".
pub fn format_time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}
