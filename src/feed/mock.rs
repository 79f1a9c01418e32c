//! Synthetic token feed.
//!
//! Stands in for a launchpad API: generates listings with category-dependent
//! price, market cap and migration progress ranges, and perturbs prices on
//! every tick.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use log::{debug, warn};
use rand::Rng;

use crate::config::{MockSettings, UpdateSettings};
use crate::models::{Category, RiskLevel, Token};

use super::{FetchError, TokenSource};

/// Meme-token names the generator cycles through.
const TOKEN_CATALOGUE: [(&str, &str); 30] = [
    ("Unreal", "Unreal Engine"),
    ("fixable", "Fixable Token"),
    ("FINAGENT", "Fin Agent AI"),
    ("SEEKEN", "SeekGen"),
    ("MOLD", "Mold Framework Official"),
    ("AYAMI", "Ayasumi"),
    ("PEPE", "Pepe the Frog"),
    ("SHIB", "Shiba Inu"),
    ("DOGE", "Dogecoin"),
    ("FLOKI", "Floki Inu"),
    ("BABY", "Baby Doge Coin"),
    ("WOJAK", "Wojak Finance"),
    ("APU", "Apu Apustaja"),
    ("BRETT", "Brett Coin"),
    ("ANDY", "Andy Warhol"),
    ("MOG", "Mog Coin"),
    ("POPCAT", "Popcat"),
    ("WIF", "dogwifhat"),
    ("BONK", "Bonk Inu"),
    ("BOME", "Book of Meme"),
    ("MEW", "Cat in Dogs World"),
    ("NEIRO", "Neiro Ethereum"),
    ("GOAT", "Goatseus Maximus"),
    ("RETARDIO", "Retardio"),
    ("GIGA", "Giga Chad"),
    ("PONKE", "Ponke"),
    ("MYRO", "Myro"),
    ("PUPS", "Bitcoin Puppies"),
    ("SEAL", "Seal"),
    ("KOMA", "Koma Inu"),
];

/// Number of points in a generated sparkline.
const PRICE_HISTORY_LEN: usize = 4;

/// Oldest generated listing age (7 days) in milliseconds.
const MAX_LISTING_AGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Random token generator implementing [`TokenSource`].
#[derive(Debug, Clone)]
pub struct MockTokenSource {
    token_count: usize,
    latency: Duration,
    failure_rate: f64,
    volatility: f64,
    change_jitter: f64,
}

impl MockTokenSource {
    pub fn new(mock: &MockSettings, updates: &UpdateSettings) -> Self {
        Self {
            token_count: mock.token_count,
            latency: Duration::from_millis(mock.latency_ms),
            failure_rate: mock.failure_rate.clamp(0.0, 1.0),
            volatility: updates.price_volatility,
            change_jitter: updates.change_jitter,
        }
    }

    /// Generate `count` listings. With a category every listing lands in it,
    /// otherwise categories are drawn uniformly.
    pub fn generate(&self, requested: Option<Category>, count: usize) -> Vec<Token> {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        let mut tokens = Vec::with_capacity(count);

        for i in 0..count {
            let (base_symbol, base_name) = TOKEN_CATALOGUE[i % TOKEN_CATALOGUE.len()];
            let generation = i / TOKEN_CATALOGUE.len();
            let category = requested.unwrap_or_else(|| Category::ALL[rng.gen_range(0..3)]);

            // Price, market cap multiplier, curve progress and 24h swing by lifecycle stage
            let (price, market_cap_multiplier, migration_progress, change_scale) = match category {
                Category::NewPairs => (
                    rng.gen::<f64>() * 0.01,
                    rng.gen_range(10_000.0..100_000.0),
                    rng.gen::<f64>() * 30.0,
                    3.0,
                ),
                Category::FinalStretch => (
                    rng.gen::<f64>() * 0.1,
                    rng.gen_range(100_000.0..500_000.0),
                    rng.gen_range(70.0..=100.0),
                    2.0,
                ),
                Category::Migrated => (
                    rng.gen::<f64>(),
                    rng.gen_range(500_000.0..5_000_000.0),
                    100.0,
                    1.0,
                ),
            };

            let market_cap = price * market_cap_multiplier;
            let volume_24h = market_cap * rng.gen_range(0.1..2.1);

            let (symbol, name) = if generation > 0 {
                (
                    format!("{}{}", base_symbol, generation),
                    format!("{} {}", base_name, generation),
                )
            } else {
                (base_symbol.to_string(), base_name.to_string())
            };

            let image_url = match base_symbol.to_lowercase().as_str() {
                "pepe" => "/tokens/pepe.png".to_string(),
                "wojak" => "/tokens/wojak.png".to_string(),
                _ => format!("/tokens/token{}.png", (i % 9) + 4),
            };

            let price_history = (0..PRICE_HISTORY_LEN)
                .map(|_| price * rng.gen_range(0.8..1.2))
                .collect();

            tokens.push(Token {
                id: format!("{}-{}", base_symbol.to_lowercase(), i),
                symbol,
                name,
                image_url,
                price,
                price_change_24h: (rng.gen::<f64>() - 0.5) * 100.0 * change_scale,
                volume_24h,
                market_cap,
                fdv: market_cap * rng.gen_range(1.2..2.0),
                liquidity: market_cap * rng.gen_range(0.05..0.2),
                trading_volume: volume_24h,
                holders: rng.gen_range(0..50_000),
                created_at: now
                    - ChronoDuration::milliseconds(rng.gen_range(0..MAX_LISTING_AGE_MS)),
                migration_progress,
                category,
                verified: rng.gen::<f64>() > 0.8,
                risk_level: RiskLevel::ALL[rng.gen_range(0..3)],
                price_history,
                last_update: now,
            });
        }

        tokens
    }

    fn roll_failure(&self) -> bool {
        self.failure_rate > 0.0 && rand::thread_rng().gen::<f64>() < self.failure_rate
    }
}

#[async_trait]
impl TokenSource for MockTokenSource {
    async fn fetch(&self, category: Option<Category>) -> Result<Vec<Token>, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.roll_failure() {
            warn!("Mock feed: simulated outage for category {:?}", category);
            return Err(FetchError::Transport("simulated feed outage".to_string()));
        }

        let tokens = self.generate(category, self.token_count);
        debug!("Mock feed: generated {} tokens", tokens.len());
        Ok(tokens)
    }

    fn next_tick(&self, tokens: &[Token]) -> Vec<Token> {
        let mut rng = rand::thread_rng();
        let now = Utc::now();

        tokens
            .iter()
            .map(|token| {
                let mut next = token.clone();
                let delta = rng.gen_range(-self.volatility..=self.volatility);
                next.price = (token.price * (1.0 + delta)).max(0.0);
                next.price_change_24h += rng.gen_range(-self.change_jitter..=self.change_jitter);
                next.last_update = now;
                next
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MockTokenSource {
        MockTokenSource::new(
            &MockSettings {
                token_count: 30,
                latency_ms: 0,
                failure_rate: 0.0,
            },
            &UpdateSettings::default(),
        )
    }

    #[test]
    fn test_generated_tokens_respect_category_ranges() {
        let source = source();

        for token in source.generate(Some(Category::NewPairs), 30) {
            assert_eq!(token.category, Category::NewPairs);
            assert!(token.price >= 0.0 && token.price < 0.01);
            assert!(token.migration_progress < 30.0);
        }

        for token in source.generate(Some(Category::Migrated), 30) {
            assert_eq!(token.category, Category::Migrated);
            assert_eq!(token.migration_progress, 100.0);
        }
    }

    #[test]
    fn test_ids_are_unique_and_suffixed_past_catalogue() {
        let tokens = source().generate(None, 45);
        let mut ids: Vec<&str> = tokens.iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 45);

        assert_eq!(tokens[6].id, "pepe-6");
        assert_eq!(tokens[6].symbol, "PEPE");
        assert_eq!(tokens[36].id, "pepe-36");
        assert_eq!(tokens[36].symbol, "PEPE1");
        assert_eq!(tokens[36].name, "Pepe the Frog 1");
    }

    #[test]
    fn test_tick_stays_within_volatility_bound() {
        let source = source();
        let tokens = source.generate(Some(Category::Migrated), 30);
        let ticked = source.next_tick(&tokens);

        for (before, after) in tokens.iter().zip(ticked.iter()) {
            assert_eq!(before.id, after.id);
            assert!(after.price >= 0.0);
            assert!((after.price - before.price).abs() <= before.price * 0.01 + 1e-12);
            assert!((after.price_change_24h - before.price_change_24h).abs() <= 1.0 + 1e-9);
        }
    }

    #[tokio::test]
    async fn test_fetch_with_category_returns_only_that_category() {
        let tokens = source().fetch(Some(Category::FinalStretch)).await.unwrap();
        assert_eq!(tokens.len(), 30);
        assert!(tokens.iter().all(|t| t.category == Category::FinalStretch));
    }

    #[tokio::test]
    async fn test_certain_failure_returns_transport_error() {
        let source = MockTokenSource::new(
            &MockSettings {
                token_count: 5,
                latency_ms: 0,
                failure_rate: 1.0,
            },
            &UpdateSettings::default(),
        );
        assert!(matches!(source.fetch(None).await, Err(FetchError::Transport(_))));
    }
}
