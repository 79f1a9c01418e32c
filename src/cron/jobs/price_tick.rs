//! Job to apply one synthetic price tick to the canonical collection.

use log::debug;

use crate::feed::TokenSource;
use crate::store::TokenStore;

/// Perturbs price and 24h change of every record and recomputes the
/// projection. Infallible; an empty collection is a no-op tick.
pub fn run(store: &mut TokenStore, source: &dyn TokenSource) {
    let start = std::time::Instant::now();

    let count = store.apply_price_tick(source).len();

    debug!(
        "Completed price_tick job in {:?} ({} tokens, {} visible)",
        start.elapsed(),
        count,
        store.visible().len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Token};

    #[test]
    fn test_tick_moves_prices() {
        let source = crate::feed::FixedTokenSource::new(Vec::new()).with_tick(2.0, 1.0);
        let mut store = TokenStore::default();
        let ticket = store.begin_load(None);
        store.finish_load(
            ticket,
            Ok(vec![Token::new("pepe-0", "PEPE", "Pepe", Category::NewPairs).with_price(1.5)]),
        );

        run(&mut store, &source);
        run(&mut store, &source);

        assert_eq!(store.tokens()[0].price, 6.0);
        assert_eq!(store.tokens()[0].price_change_24h, 2.0);
        assert_eq!(store.visible()[0].price, 6.0);
    }
}
