use super::BearerToken;

use crate::{config::ApiSettings, FlightWatchError};

use async_trait::async_trait;
use log::*;
use reqwest::Client;
use serde::Deserialize;

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn obtain_credential(&self) -> Result<BearerToken, FlightWatchError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client-credentials exchange against the flight API's OAuth2 token endpoint.
pub struct ClientCredentialsAuth {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentialsAuth {
    pub fn new(client: Client, settings: &ApiSettings) -> Self {
        ClientCredentialsAuth {
            client,
            token_url: format!("{}/v1/security/oauth2/token", settings.base_url),
            client_id: settings.key.clone(),
            client_secret: settings.secret.clone(),
        }
    }
}

#[async_trait]
impl AuthProvider for ClientCredentialsAuth {
    async fn obtain_credential(&self) -> Result<BearerToken, FlightWatchError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response: TokenResponse = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(FlightWatchError::Auth)?
            .json()
            .await
            .map_err(FlightWatchError::Auth)?;
        trace!("Received access token from flight API.");

        Ok(BearerToken::new(response.access_token))
    }
}
