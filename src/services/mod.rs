use std::str::FromStr;

use derive_more::Display;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub mod auth;
pub mod flights;
pub mod locations;
pub mod mail;
pub mod storage;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display(fmt = "{}, {}", city, country_code)]
pub struct Location {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country_code: String,
    /// Empty until resolved. A `null` in the file reads as empty.
    #[serde(default, rename = "iata_code", deserialize_with = "null_as_empty")]
    pub location_code: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Location {
    pub fn is_resolved(&self) -> bool {
        !self.location_code.trim().is_empty()
    }
}

/// A single flight offer, kept exactly as the fare API returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FareQuote(pub Value);

impl FareQuote {
    /// `price.total`, which the API sends as a decimal string.
    pub fn total_price(&self) -> Option<Decimal> {
        match self.0.pointer("/price/total")? {
            Value::String(total) => Decimal::from_str(total.trim()).ok(),
            Value::Number(total) => Decimal::from_str(&total.to_string()).ok(),
            _ => None,
        }
    }

    pub fn total_price_text(&self) -> Option<String> {
        match self.0.pointer("/price/total")? {
            Value::String(total) => Some(total.clone()),
            Value::Number(total) => Some(total.to_string()),
            _ => None,
        }
    }

    pub fn departure_at(&self) -> Option<&str> {
        self.0
            .pointer("/itineraries/0/segments/0/departure/at")?
            .as_str()
    }
}

/// Cheapest quote ever observed, per destination city, in first-seen order.
pub type BestFareMap = IndexMap<String, FareQuote>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub departure: Location,
    #[serde(default)]
    pub destinations: Vec<Location>,
    #[serde(default, rename = "flights")]
    pub best_fares: BestFareMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Improvement {
    pub city: String,
    pub quote: FareQuote,
}

#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        BearerToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Origin, destination and the fixed search parameters for one destination lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub adults: u32,
    pub currency: String,
    pub max_results: u32,
}

#[cfg(test)]
pub(crate) fn quote(total: &str, at: &str) -> FareQuote {
    FareQuote(serde_json::json!({
        "type": "flight-offer",
        "price": { "currency": "USD", "total": total },
        "itineraries": [{
            "segments": [{ "departure": { "iataCode": "SEA", "at": at } }]
        }]
    }))
}
