use log::*;

use crate::{
    config::SearchParams,
    services::{
        auth::AuthProvider, flights::FareQuoteService, locations::LocationResolver,
        mail::Notifier, storage::StateStore, BearerToken, BestFareMap, FareQuery, FareQuote,
        Improvement, Location, PersistedState,
    },
    FlightWatchError,
};

/// The external collaborators a tracker talks to.
pub struct Services {
    pub auth: Box<dyn AuthProvider>,
    pub locations: Box<dyn LocationResolver>,
    pub fares: Box<dyn FareQuoteService>,
    pub notifier: Box<dyn Notifier>,
    pub store: Box<dyn StateStore>,
}

pub struct FareTracker {
    services: Services,
    search: SearchParams,
    state: PersistedState,
}

impl FareTracker {
    /// Loads and validates the persisted state, then resolves any missing
    /// location codes and saves the result. Validation happens before any
    /// network call.
    pub async fn initialize(
        services: Services,
        search: SearchParams,
    ) -> Result<Self, FlightWatchError> {
        let mut state = services.store.load().await?;
        validate(&state)?;

        let token = services.auth.obtain_credential().await?;
        resolve_location(services.locations.as_ref(), &token, &mut state.departure).await?;
        for destination in state.destinations.iter_mut() {
            resolve_location(services.locations.as_ref(), &token, destination).await?;
        }
        services.store.save(&state).await?;

        Ok(FareTracker {
            services,
            search,
            state,
        })
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    /// Fetches fares for every destination and records any new cheapest fare.
    ///
    /// A failed fetch only skips its own destination. The state is saved
    /// whether or not anything improved; a failed notification is logged and
    /// does not undo the save.
    pub async fn run_tracking_cycle(&mut self) -> Result<Vec<Improvement>, FlightWatchError> {
        let token = self.services.auth.obtain_credential().await?;

        let PersistedState {
            departure,
            destinations,
            best_fares,
        } = &mut self.state;

        let mut improvements: Vec<Improvement> = Vec::new();
        for destination in destinations.iter() {
            let query = fare_query(departure, destination, &self.search);
            let quotes = match self
                .services
                .fares
                .search(&destination.city, &query, &token)
                .await
            {
                Ok(quotes) => quotes,
                Err(e) => {
                    error!("{}", e);
                    continue;
                }
            };

            if let Some(quote) = record_quotes(best_fares, &destination.city, quotes) {
                info!(
                    "New cheapest flight to {}: ${}.",
                    destination.city,
                    quote.total_price_text().unwrap_or_else(|| "?".to_string())
                );
                push_improvement(&mut improvements, &destination.city, quote);
            }
        }

        self.services.store.save(&self.state).await?;

        if improvements.is_empty() {
            debug!("No cheaper flights found this run.");
        } else if let Err(e) = self.services.notifier.notify(&improvements).await {
            error!("{}", e);
        }

        Ok(improvements)
    }
}

fn validate(state: &PersistedState) -> Result<(), FlightWatchError> {
    if state.departure.city.trim().is_empty() {
        return Err(FlightWatchError::Config("no departure found".to_string()));
    }
    if state.destinations.is_empty() {
        return Err(FlightWatchError::Config("no destinations found".to_string()));
    }
    Ok(())
}

async fn resolve_location(
    resolver: &dyn LocationResolver,
    token: &BearerToken,
    location: &mut Location,
) -> Result<(), FlightWatchError> {
    if location.is_resolved() {
        return Ok(());
    }
    location.location_code = resolver
        .resolve(&location.city, &location.country_code, token)
        .await?;
    info!("Resolved {} to {}.", location, location.location_code);
    Ok(())
}

fn fare_query(departure: &Location, destination: &Location, search: &SearchParams) -> FareQuery {
    FareQuery {
        origin: departure.location_code.clone(),
        destination: destination.location_code.clone(),
        departure_date: search.departure_date.clone(),
        adults: search.adults,
        currency: search.currency.clone(),
        max_results: search.max_results,
    }
}

/// Folds `quotes` into the best fare for `city`, in order. Returns the final
/// quote that lowered it, if any did.
///
/// A quote replaces the stored one when no fare is stored, the stored fare has
/// no readable price, or its total is strictly lower. Quotes without a
/// readable price are skipped.
pub fn record_quotes(
    best_fares: &mut BestFareMap,
    city: &str,
    quotes: impl IntoIterator<Item = FareQuote>,
) -> Option<FareQuote> {
    let mut improved = None;

    for quote in quotes {
        let Some(price) = quote.total_price() else {
            warn!("Skipping flight to {} without a readable price.", city);
            continue;
        };

        let cheaper = match best_fares.get(city).and_then(FareQuote::total_price) {
            Some(best) => price < best,
            None => true,
        };
        if cheaper {
            best_fares.insert(city.to_string(), quote.clone());
            improved = Some(quote);
        }
    }

    improved
}

/// One entry per city, holding the latest improvement.
fn push_improvement(improvements: &mut Vec<Improvement>, city: &str, quote: FareQuote) {
    match improvements.iter_mut().find(|existing| existing.city == city) {
        Some(existing) => existing.quote = quote,
        None => improvements.push(Improvement {
            city: city.to_string(),
            quote,
        }),
    }
}
