//! Visible projection of the canonical token collection.
//!
//! The projection is a pure function of the collection and the current view
//! parameters. It is applied in a fixed order:
//!
//! 1. Category filter (`all` keeps everything)
//! 2. Case-insensitive substring search over name OR symbol
//! 3. Stable sort on the selected field, ascending or descending
//!
//! Ties keep their relative order from the canonical collection in both
//! directions, so identical inputs always give identical output.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{Category, Token};

// ============================================
// View Parameters
// ============================================

/// Category filter selected in the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    #[inline]
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        CategoryFilter::Only(category)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(category) => f.write_str(category.as_str()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(CategoryFilter::All)
        } else {
            s.parse::<Category>().map(CategoryFilter::Only)
        }
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        filter.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Sortable token fields.
///
/// Numeric fields compare numerically, text fields (category included) with a
/// locale-style collation, timestamps chronologically, risk by severity and
/// `verified` with unverified first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Id,
    Symbol,
    Name,
    Price,
    PriceChange24h,
    Volume24h,
    MarketCap,
    Fdv,
    Holders,
    #[default]
    CreatedAt,
    MigrationProgress,
    Category,
    Verified,
    RiskLevel,
    Liquidity,
    TradingVolume,
    LastUpdate,
}

/// The full set of parameters the projection depends on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewParams {
    pub category: CategoryFilter,
    pub search: String,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

impl ViewParams {
    pub fn project(&self, tokens: &[Token]) -> Vec<Token> {
        project(
            tokens,
            self.category,
            &self.search,
            self.sort_field,
            self.sort_direction,
        )
    }
}

// ============================================
// Projection
// ============================================

/// Recompute the visible projection from the canonical collection.
///
/// # Arguments
/// * `tokens` - The canonical collection, in canonical order
/// * `category` - Category filter (`All` keeps every record)
/// * `search` - Search text; empty disables the search stage
/// * `field` - Sort key
/// * `direction` - Ascending or descending
///
/// # Returns
/// * A new vector; the input is never modified
pub fn project(
    tokens: &[Token],
    category: CategoryFilter,
    search: &str,
    field: SortField,
    direction: SortDirection,
) -> Vec<Token> {
    let query = search.to_lowercase();

    let mut visible: Vec<Token> = tokens
        .iter()
        .filter(|token| category.matches(token.category))
        .filter(|token| query.is_empty() || matches_search(token, &query))
        .cloned()
        .collect();

    // slice::sort_by is stable
    visible.sort_by(|a, b| match direction {
        SortDirection::Asc => compare_by(a, b, field),
        SortDirection::Desc => compare_by(b, a, field),
    });

    visible
}

/// `query` must already be lowercase.
#[inline]
fn matches_search(token: &Token, query: &str) -> bool {
    token.name.to_lowercase().contains(query) || token.symbol.to_lowercase().contains(query)
}

/// Compare two records on a single field.
pub fn compare_by(a: &Token, b: &Token, field: SortField) -> Ordering {
    match field {
        SortField::Id => locale_compare(&a.id, &b.id),
        SortField::Symbol => locale_compare(&a.symbol, &b.symbol),
        SortField::Name => locale_compare(&a.name, &b.name),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::PriceChange24h => a.price_change_24h.total_cmp(&b.price_change_24h),
        SortField::Volume24h => a.volume_24h.total_cmp(&b.volume_24h),
        SortField::MarketCap => a.market_cap.total_cmp(&b.market_cap),
        SortField::Fdv => a.fdv.total_cmp(&b.fdv),
        SortField::Holders => a.holders.cmp(&b.holders),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::MigrationProgress => a.migration_progress.total_cmp(&b.migration_progress),
        SortField::Category => locale_compare(a.category.as_str(), b.category.as_str()),
        SortField::Verified => a.verified.cmp(&b.verified),
        SortField::RiskLevel => a.risk_level.cmp(&b.risk_level),
        SortField::Liquidity => a.liquidity.total_cmp(&b.liquidity),
        SortField::TradingVolume => a.trading_volume.total_cmp(&b.trading_volume),
        SortField::LastUpdate => a.last_update.cmp(&b.last_update),
    }
}

/// Locale-style string collation.
///
/// Three levels, each consulted only on a tie of the previous one:
///
/// 1. Base letters, ignoring case and accents ("Éclair" sorts with "eclair")
/// 2. Accents, unaccented first ("eclair" < "éclair")
/// 3. Case, lowercase first ("pepe" < "Pepe" < "PEPE")
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let primary = base_letters(a).cmp(base_letters(b));

    primary
        .then_with(|| {
            a.nfd()
                .flat_map(char::to_lowercase)
                .cmp(b.nfd().flat_map(char::to_lowercase))
        })
        .then_with(|| {
            a.nfd()
                .zip(b.nfd())
                .map(|(x, y)| x.is_uppercase().cmp(&y.is_uppercase()))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}

/// Decomposed, lowercased characters with combining marks removed.
fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}
