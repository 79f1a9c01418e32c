//! Real-time price update payloads.
//!
//! A live feed pushes JSON messages carrying one update or a batch:
//!
//! ```json
//! { "id": "pepe-6", "price": 0.0042, "priceChange24h": 12.5 }
//! [ { "id": "pepe-6", "price": 0.0042 }, { "id": "wif-17", "price": 0.31 } ]
//! ```
//!
//! A message is accepted or rejected as a whole. Rejected messages are logged
//! by the caller and dropped; the last known good state stays in place.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::utils::{validate_usd_amount, validate_usd_price};

use super::MessageError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub id: String,
    pub price: f64,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl PriceUpdate {
    fn validate(&self) -> Result<(), MessageError> {
        let invalid = |reason: &str| MessageError::Invalid {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if validate_usd_price(self.price).is_none() {
            return Err(invalid("price out of range"));
        }
        if self.price_change_24h.is_some_and(|change| !change.is_finite()) {
            return Err(invalid("non-finite 24h change"));
        }
        if self
            .volume_24h
            .is_some_and(|volume| validate_usd_amount(volume) != volume)
        {
            return Err(invalid("negative volume"));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Single(PriceUpdate),
    Batch(Vec<PriceUpdate>),
}

/// Parse and validate a raw real-time message.
pub fn parse_message(raw: &str) -> Result<Vec<PriceUpdate>, MessageError> {
    let updates = match serde_json::from_str::<Payload>(raw)? {
        Payload::Single(update) => vec![update],
        Payload::Batch(updates) => updates,
    };

    for update in &updates {
        update.validate()?;
    }

    Ok(updates)
}
