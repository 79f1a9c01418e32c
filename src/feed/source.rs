use async_trait::async_trait;

use crate::models::{Category, Token};

use super::FetchError;

/// A source of token records and periodic price deltas.
///
/// The store and projection never depend on a particular generator: the
/// synthetic [`MockTokenSource`](super::MockTokenSource) backs the binary,
/// [`FixedTokenSource`](super::FixedTokenSource) backs tests, and a live feed
/// adapter would implement the same two calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch a fresh collection, optionally restricted to one category.
    async fn fetch(&self, category: Option<Category>) -> Result<Vec<Token>, FetchError>;

    /// Produce the next price state for `tokens`.
    ///
    /// Must be cheap and infallible; the store takes price and 24h change
    /// from the result, matched by id, and ignores every other field.
    fn next_tick(&self, tokens: &[Token]) -> Vec<Token>;
}
