use async_trait::async_trait;
use chrono::Utc;

use crate::models::{Category, Token};

use super::{FetchError, TokenSource};

/// Deterministic [`TokenSource`] serving a fixed collection.
///
/// Ticks multiply every price by a constant factor and add a constant step
/// to the 24h change, so tests and demos can predict the next state.
#[derive(Debug)]
pub struct FixedTokenSource {
    tokens: Vec<Token>,
    failure: Option<FetchError>,
    price_factor: f64,
    change_step: f64,
}

impl FixedTokenSource {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            failure: None,
            price_factor: 1.0,
            change_step: 0.0,
        }
    }

    /// Every fetch fails with `error`.
    pub fn failing(mut self, error: FetchError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn with_tick(mut self, price_factor: f64, change_step: f64) -> Self {
        self.price_factor = price_factor;
        self.change_step = change_step;
        self
    }
}

#[async_trait]
impl TokenSource for FixedTokenSource {
    async fn fetch(&self, category: Option<Category>) -> Result<Vec<Token>, FetchError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        Ok(self
            .tokens
            .iter()
            .filter(|token| category.map_or(true, |c| token.category == c))
            .cloned()
            .collect())
    }

    fn next_tick(&self, tokens: &[Token]) -> Vec<Token> {
        let now = Utc::now();
        tokens
            .iter()
            .map(|token| {
                let mut next = token.clone();
                next.price = token.price * self.price_factor;
                next.price_change_24h = token.price_change_24h + self.change_step;
                next.last_update = now;
                next
            })
            .collect()
    }
}
