use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ns_board::config::AppConfig;
use ns_board::domain::{Departure, StationCode};
use ns_board::polling::{BoardFeed, LoadState, Snapshot, Subscription};
use ns_board::stations::StationDirectory;
use ns_board::transit::TransitClient;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match TransitClient::new(config.transit.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // A bad NS_STATION falls back to the default rather than aborting.
    let requested = match StationCode::parse(&config.station) {
        Ok(code) => Some(code),
        Err(e) => {
            warn!(station = %config.station, error = %e, "ignoring NS_STATION");
            None
        }
    };

    let directory = StationDirectory::new(Arc::clone(&client));
    let station = match directory.default_station(requested.as_ref()).await {
        Ok(Some(station)) => station,
        Ok(None) => {
            error!("station catalog is empty");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!(error = %e, "failed to load station catalog");
            return ExitCode::FAILURE;
        }
    };
    info!(code = %station.code, name = %station.display_name, "showing departures");

    let subscription = Subscription::start(
        client,
        BoardFeed::departures(station.code.clone()),
        config.poll,
    );
    report_until(subscription.watch(), tokio::signal::ctrl_c()).await;

    subscription.unsubscribe();
    ExitCode::SUCCESS
}

/// Log every published board until `shutdown` resolves or the feed closes.
async fn report_until<S: Future>(
    mut updates: watch::Receiver<Snapshot<Departure>>,
    shutdown: S,
) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                log_snapshot(&snapshot);
            }
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
        }
    }
}

fn log_snapshot(snapshot: &Snapshot<Departure>) {
    match snapshot.state {
        LoadState::Ready => {
            for departure in snapshot.data.iter() {
                info!(
                    time = %departure.scheduled_time.format("%H:%M"),
                    delay = departure.delay_minutes,
                    platform = departure.platform(),
                    cancelled = departure.cancelled,
                    "{} {} to {}",
                    departure.train_category_code,
                    departure.service_number,
                    departure.destination_name,
                );
            }
        }
        LoadState::Failed => {
            error!(
                error = snapshot.error_message.as_deref().unwrap_or("unknown error"),
                "departures unavailable"
            );
        }
        _ => {}
    }
}
