use std::path::PathBuf;

use async_trait::async_trait;
use log::*;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::FlightWatchError;

use super::PersistedState;

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<PersistedState, FlightWatchError>;
    async fn save(&self, state: &PersistedState) -> Result<(), FlightWatchError>;
}

/// Whole-file JSON store. The file is rewritten on every save and never locked.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    fn persistence_error(&self, source: std::io::Error) -> FlightWatchError {
        FlightWatchError::Persistence {
            path: self.path.clone(),
            source,
        }
    }

    fn malformed(&self, source: serde_json::Error) -> FlightWatchError {
        FlightWatchError::MalformedState {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<PersistedState, FlightWatchError> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.persistence_error(e))?;
        let state = serde_json::from_slice(&raw).map_err(|e| self.malformed(e))?;
        trace!("Loaded flight data from {}.", self.path.display());
        Ok(state)
    }

    async fn save(&self, state: &PersistedState) -> Result<(), FlightWatchError> {
        let mut raw = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut raw, PrettyFormatter::with_indent(b"    "));
        state
            .serialize(&mut serializer)
            .map_err(|e| self.malformed(e))?;

        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| self.persistence_error(e))?;
        debug!("Saved flight data to {}.", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{quote, Location};
    use serde_json::json;

    fn location(city: &str, country_code: &str, code: &str) -> Location {
        Location {
            city: city.to_string(),
            country_code: country_code.to_string(),
            location_code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("flight_data.json"));

        let mut state = PersistedState {
            departure: location("Seattle", "US", "SEA"),
            destinations: vec![location("Paris", "FR", "PAR"), location("Tokyo", "JP", "")],
            ..Default::default()
        };
        state
            .best_fares
            .insert("Paris".to_string(), quote("300.00", "2025-02-01T10:00:00"));

        store.save(&state).await.unwrap();
        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded, state);

        store.save(&reloaded).await.unwrap();
        assert_eq!(store.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn reads_hand_written_file_and_writes_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight_data.json");
        let hand_written = json!({
            "departure": { "city": "Seattle", "country_code": "US", "iata_code": "" },
            "destinations": [{ "city": "Paris", "country_code": "FR", "iata_code": "" }],
            "flights": {}
        });
        std::fs::write(&path, hand_written.to_string()).unwrap();

        let store = JsonFileStore::new(&path);
        let state = store.load().await.unwrap();
        assert_eq!(state.departure.city, "Seattle");
        assert!(!state.destinations[0].is_resolved());
        assert!(state.best_fares.is_empty());

        store.save(&state).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("{\n    \"departure\": {\n        \"city\": \"Seattle\""));
        assert_eq!(serde_json::from_str::<serde_json::Value>(&written).unwrap(), hand_written);
    }

    #[tokio::test]
    async fn null_location_code_loads_as_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight_data.json");
        let hand_written = json!({
            "departure": { "city": "Seattle", "country_code": "US", "iata_code": null },
            "destinations": [{ "city": "Paris", "country_code": "FR", "iata_code": null }],
            "flights": {}
        });
        std::fs::write(&path, hand_written.to_string()).unwrap();

        let state = JsonFileStore::new(&path).load().await.unwrap();

        assert!(!state.departure.is_resolved());
        assert_eq!(state.destinations[0].location_code, "");
    }

    #[tokio::test]
    async fn flights_keep_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("flight_data.json"));
        let mut state = PersistedState {
            departure: location("Seattle", "US", "SEA"),
            ..Default::default()
        };
        state
            .best_fares
            .insert("Tokyo".to_string(), quote("812.40", "2025-02-01T13:35:00"));
        state
            .best_fares
            .insert("Paris".to_string(), quote("300.00", "2025-02-01T10:00:00"));

        store.save(&state).await.unwrap();
        let cities: Vec<String> = store.load().await.unwrap().best_fares.into_keys().collect();

        assert_eq!(cities, vec!["Tokyo", "Paris"]);
    }

    #[tokio::test]
    async fn missing_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, FlightWatchError::Persistence { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn invalid_json_is_malformed_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight_data.json");
        std::fs::write(&path, "{ \"departure\": ").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, FlightWatchError::MalformedState { .. }));
    }
}
