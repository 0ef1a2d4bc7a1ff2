use super::BearerToken;

use crate::{config::ApiSettings, FlightWatchError};

use async_trait::async_trait;
use log::*;
use reqwest::Client;
use serde::Deserialize;

#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(
        &self,
        city: &str,
        country_code: &str,
        token: &BearerToken,
    ) -> Result<String, FlightWatchError>;
}

#[derive(Deserialize)]
struct CitySearchResponse {
    #[serde(default)]
    data: Vec<CityMatch>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CityMatch {
    iata_code: Option<String>,
}

/// City search on the flight API's location reference data.
pub struct CitySearchResolver {
    client: Client,
    url: String,
}

impl CitySearchResolver {
    pub fn new(client: Client, settings: &ApiSettings) -> Self {
        CitySearchResolver {
            client,
            url: format!("{}/v1/reference-data/locations/cities", settings.base_url),
        }
    }
}

#[async_trait]
impl LocationResolver for CitySearchResolver {
    async fn resolve(
        &self,
        city: &str,
        country_code: &str,
        token: &BearerToken,
    ) -> Result<String, FlightWatchError> {
        let not_found = |source| FlightWatchError::LocationNotFound {
            city: city.to_string(),
            country_code: country_code.to_string(),
            source,
        };

        let response: CitySearchResponse = self
            .client
            .get(&self.url)
            .bearer_auth(token.as_str())
            .query(&[("countryCode", country_code), ("keyword", city)])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| not_found(Some(e)))?
            .json()
            .await
            .map_err(|e| not_found(Some(e)))?;

        let code = response
            .data
            .into_iter()
            .next()
            .and_then(|found| found.iata_code)
            .filter(|code| !code.is_empty())
            .ok_or_else(|| not_found(None))?;
        trace!("Resolved {} ({}) to {}.", city, country_code, code);

        Ok(code)
    }
}
