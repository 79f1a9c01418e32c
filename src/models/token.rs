use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a token on the launchpad.
///
/// Ordered by stage: a token starts as a new pair, enters the final stretch
/// as its bonding curve fills, and ends up migrated to an AMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    NewPairs,
    FinalStretch,
    Migrated,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::NewPairs,
        Category::FinalStretch,
        Category::Migrated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::NewPairs => "new-pairs",
            Category::FinalStretch => "final-stretch",
            Category::Migrated => "migrated",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new-pairs" => Ok(Category::NewPairs),
            "final-stretch" => Ok(Category::FinalStretch),
            "migrated" => Ok(Category::Migrated),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Risk rating shown next to a token. Ordered low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];
}

/// Token listing and current market state.
///
/// Primary Key: id
/// Query Pattern: "Show tokens in category X matching 'pep', sorted by price"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    // Primary key
    pub id: String,

    // Display metadata
    pub symbol: String,
    pub name: String,
    pub image_url: String,

    // Current price state
    pub price: f64,
    pub price_change_24h: f64,

    // Market data
    pub volume_24h: f64,
    pub market_cap: f64,
    pub fdv: f64,
    pub liquidity: f64,
    pub trading_volume: f64,
    pub holders: u64,

    // Lifecycle
    pub created_at: DateTime<Utc>,
    pub migration_progress: f64,
    pub category: Category,

    // Trust signals
    pub verified: bool,
    pub risk_level: RiskLevel,

    // Short sparkline history, oldest first
    pub price_history: Vec<f64>,
    pub last_update: DateTime<Utc>,
}

impl Token {
    /// Constructor for just identity and category; market fields start at zero.
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        category: Category,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            image_url: String::new(),
            price: 0.0,
            price_change_24h: 0.0,
            volume_24h: 0.0,
            market_cap: 0.0,
            fdv: 0.0,
            liquidity: 0.0,
            trading_volume: 0.0,
            holders: 0,
            created_at: now,
            migration_progress: if category == Category::Migrated { 100.0 } else { 0.0 },
            category,
            verified: false,
            risk_level: RiskLevel::Medium,
            price_history: Vec::new(),
            last_update: now,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_migration_progress(mut self, progress: f64) -> Self {
        self.migration_progress = progress;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("graduated".parse::<Category>().is_err());
    }

    #[test]
    fn test_token_serializes_with_camel_case_fields() {
        let token =
            Token::new("pepe-6", "PEPE", "Pepe the Frog", Category::FinalStretch).with_price(0.05);
        let json = serde_json::to_value(&token).unwrap();

        assert_eq!(json["priceChange24h"], 0.0);
        assert_eq!(json["volume24h"], 0.0);
        assert_eq!(json["category"], "final-stretch");
        assert_eq!(json["riskLevel"], "medium");
        assert_eq!(json["price"], 0.05);
    }

    #[test]
    fn test_migrated_token_starts_complete() {
        let token = Token::new("wif-17", "WIF", "dogwifhat", Category::Migrated);
        assert_eq!(token.migration_progress, 100.0);
    }

    #[test]
    fn test_risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }
}
