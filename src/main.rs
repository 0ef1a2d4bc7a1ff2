use std::process::ExitCode;

use log::*;

mod config;
mod error;
mod services;
mod tracker;

pub use error::{FlightWatchError, GenericError};

use config::Settings;
use services::{
    auth::ClientCredentialsAuth, flights::FlightOffersService, locations::CitySearchResolver,
    mail::SmtpNotifier, storage::JsonFileStore,
};
use tracker::{FareTracker, Services};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::builder()
        .filter_module("flight_watch", LevelFilter::Info)
        .parse_default_env()
        .init();
    trace!("Logger init.");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(why) if why.is_fatal() => {
            error!("{}", why);
            ExitCode::FAILURE
        }
        Err(why) => {
            warn!("{}", why);
            ExitCode::SUCCESS
        }
    }
}

async fn run() -> Result<(), FlightWatchError> {
    let settings = Settings::from_env()?;
    trace!("Read settings from env: {:?}", settings);

    let client = reqwest::Client::new();
    let services = Services {
        auth: Box::new(ClientCredentialsAuth::new(client.clone(), &settings.api)),
        locations: Box::new(CitySearchResolver::new(client.clone(), &settings.api)),
        fares: Box::new(FlightOffersService::new(client, &settings.api)),
        notifier: Box::new(SmtpNotifier::new(settings.smtp.clone())),
        store: Box::new(JsonFileStore::new(&settings.data_path)),
    };

    let mut tracker = FareTracker::initialize(services, settings.search.clone()).await?;
    info!(
        "Tracking {} destination(s) from {}.",
        tracker.state().destinations.len(),
        tracker.state().departure
    );

    let improvements = tracker.run_tracking_cycle().await?;
    info!("Run complete, {} cheaper flight(s) found.", improvements.len());

    Ok(())
}
