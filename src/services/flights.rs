use super::{BearerToken, FareQuery, FareQuote};

use crate::{config::ApiSettings, FlightWatchError};

use async_trait::async_trait;
use log::*;
use reqwest::Client;
use serde::Deserialize;

#[async_trait]
pub trait FareQuoteService: Send + Sync {
    /// `city` only labels errors; the lookup itself is by location code.
    async fn search(
        &self,
        city: &str,
        query: &FareQuery,
        token: &BearerToken,
    ) -> Result<Vec<FareQuote>, FlightWatchError>;
}

#[derive(Deserialize)]
struct FlightOffersResponse {
    data: Vec<FareQuote>,
}

pub struct FlightOffersService {
    client: Client,
    url: String,
}

impl FlightOffersService {
    pub fn new(client: Client, settings: &ApiSettings) -> Self {
        FlightOffersService {
            client,
            url: format!("{}/v2/shopping/flight-offers", settings.base_url),
        }
    }
}

#[async_trait]
impl FareQuoteService for FlightOffersService {
    async fn search(
        &self,
        city: &str,
        query: &FareQuery,
        token: &BearerToken,
    ) -> Result<Vec<FareQuote>, FlightWatchError> {
        let fetch_error = |source| FlightWatchError::Fetch {
            city: city.to_string(),
            source,
        };

        let adults = query.adults.to_string();
        let max = query.max_results.to_string();
        let params = [
            ("originLocationCode", query.origin.as_str()),
            ("destinationLocationCode", query.destination.as_str()),
            ("departureDate", query.departure_date.as_str()),
            ("adults", adults.as_str()),
            ("currencyCode", query.currency.as_str()),
            ("max", max.as_str()),
        ];

        let response: FlightOffersResponse = self
            .client
            .get(&self.url)
            .bearer_auth(token.as_str())
            .query(&params)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(fetch_error)?
            .json()
            .await
            .map_err(fetch_error)?;
        trace!(
            "Received {} offers for {} -> {}.",
            response.data.len(),
            query.origin,
            query.destination
        );

        Ok(response.data)
    }
}
