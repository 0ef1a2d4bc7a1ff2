use std::path::PathBuf;

use thiserror::Error;

pub type GenericError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FlightWatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to get access token: {0}")]
    Auth(#[source] reqwest::Error),

    #[error("no location code found for {city} ({country_code})")]
    LocationNotFound {
        city: String,
        country_code: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("error checking flights to {city}: {source}")]
    Fetch {
        city: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error accessing flight data at {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed flight data at {}: {source}", path.display())]
    MalformedState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("error sending flight data: {0}")]
    Delivery(#[source] GenericError),
}

impl FlightWatchError {
    /// Fetch and delivery failures are logged and skipped; everything else ends the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Fetch { .. } | Self::Delivery(_))
    }
}
