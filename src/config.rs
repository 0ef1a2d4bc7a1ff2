use std::path::PathBuf;
use std::str::FromStr;

use log::*;

use crate::FlightWatchError;

const DEFAULT_DATA_PATH: &str = "flight_data.json";
const DEFAULT_DEPARTURE_DATE: &str = "2025-02-01";
const DEFAULT_ADULTS: u32 = 2;
const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_MAX_RESULTS: u32 = 10;

const SMTP_KEYS: [&str; 4] = ["SMTP_HOST", "SMTP_PORT", "SMTP_EMAIL", "SMTP_TOKEN"];

#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub smtp: Option<SmtpSettings>,
    pub search: SearchParams,
    pub data_path: PathBuf,
}

#[derive(Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub key: String,
    pub secret: String,
}

impl std::fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("key", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub email: String,
    pub token: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Fixed parameters of every fare query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub departure_date: String,
    pub adults: u32,
    pub currency: String,
    pub max_results: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            departure_date: DEFAULT_DEPARTURE_DATE.to_string(),
            adults: DEFAULT_ADULTS,
            currency: DEFAULT_CURRENCY.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment, loading `.env` if present.
    pub fn from_env() -> Result<Self, FlightWatchError> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlightWatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| FlightWatchError::Config(format!("{} is not set", key)))
        };

        let api = ApiSettings {
            base_url: require("FLIGHT_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            key: require("FLIGHT_API_KEY")?,
            secret: require("FLIGHT_API_SECRET")?,
        };

        let smtp = match (
            get("SMTP_HOST"),
            get("SMTP_PORT"),
            get("SMTP_EMAIL"),
            get("SMTP_TOKEN"),
        ) {
            (Some(host), Some(port), Some(email), Some(token)) => Some(SmtpSettings {
                host,
                port: parse("SMTP_PORT", &port)?,
                email,
                token,
            }),
            _ => {
                let missing = missing_smtp_keys(&get);
                if missing.len() < SMTP_KEYS.len() {
                    warn!("SMTP settings incomplete, missing {}.", missing.join(", "));
                }
                None
            }
        };

        let defaults = SearchParams::default();
        let search = SearchParams {
            departure_date: get("FLIGHT_DEPARTURE_DATE").unwrap_or(defaults.departure_date),
            adults: get("FLIGHT_ADULTS")
                .map(|value| parse("FLIGHT_ADULTS", &value))
                .transpose()?
                .unwrap_or(defaults.adults),
            currency: get("FLIGHT_CURRENCY").unwrap_or(defaults.currency),
            max_results: get("FLIGHT_MAX_RESULTS")
                .map(|value| parse("FLIGHT_MAX_RESULTS", &value))
                .transpose()?
                .unwrap_or(defaults.max_results),
        };

        Ok(Settings {
            api,
            smtp,
            search,
            data_path: get("FLIGHT_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
        })
    }
}

/// SMTP variables that are unset or blank.
fn missing_smtp_keys<F>(get: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    SMTP_KEYS
        .into_iter()
        .filter(|key| get(*key).is_none())
        .collect()
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, FlightWatchError> {
    value
        .trim()
        .parse()
        .map_err(|_| FlightWatchError::Config(format!("{} has invalid value {:?}", key, value)))
}
