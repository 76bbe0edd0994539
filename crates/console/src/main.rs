//! `frostdesk-console` -- headless console daemon.
//!
//! Wires the HTTP booking gateway, the file-backed notification
//! ledger, and the poller together, then logs console events until
//! interrupted. Useful for operating the synchronization subsystem
//! without a UI in front of it.
//!
//! # Environment variables
//!
//! | Variable                      | Required | Default                  | Description                        |
//! |-------------------------------|----------|--------------------------|------------------------------------|
//! | `FROSTDESK_API_URL`           | yes      | --                       | Backend base URL, e.g. `http://host:4000/api` |
//! | `FROSTDESK_POLL_INTERVAL_SECS`| no       | `120`                    | Seconds between scheduled resyncs  |
//! | `FROSTDESK_LEDGER_PATH`       | no       | `frostdesk-ledger.json`  | Notification dedup ledger location |

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frostdesk_console::{
    AppointmentStore, ConsoleEvent, ConsoleEvents, FileLedger, NotificationCenter, Poller,
};
use frostdesk_gateway::{BookingApi, HttpBookingApi};

/// Default interval between scheduled resyncs.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;

/// Default dedup ledger location.
const DEFAULT_LEDGER_PATH: &str = "frostdesk-ledger.json";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frostdesk_console=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_url = std::env::var("FROSTDESK_API_URL").unwrap_or_else(|_| {
        tracing::error!("FROSTDESK_API_URL environment variable is required");
        std::process::exit(1);
    });

    let interval_secs: u64 = std::env::var("FROSTDESK_POLL_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

    let ledger_path = std::env::var("FROSTDESK_LEDGER_PATH")
        .unwrap_or_else(|_| DEFAULT_LEDGER_PATH.to_string());

    tracing::info!(
        api_url = %api_url,
        interval_secs,
        ledger_path = %ledger_path,
        "Frostdesk console starting",
    );

    let gateway = Arc::new(HttpBookingApi::new(api_url));
    let store = Arc::new(AppointmentStore::new());
    let notifications = Arc::new(NotificationCenter::open(Box::new(FileLedger::new(
        ledger_path,
    ))));
    let events = Arc::new(ConsoleEvents::default());

    // The roster feeds the acceptance UI; log it once at startup.
    match gateway.list_technicians().await {
        Ok(roster) => {
            let names: Vec<&str> = roster.iter().map(|t| t.name.as_str()).collect();
            tracing::info!(count = roster.len(), ?names, "Technician roster loaded");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not load technician roster");
        }
    }

    let poller = Arc::new(Poller::new(
        Arc::clone(&gateway),
        Arc::clone(&store),
        Arc::clone(&notifications),
        Arc::clone(&events),
    ));

    let mut rx = events.subscribe();
    let event_logger = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                ConsoleEvent::SyncStarted { manual } => {
                    tracing::debug!(manual, "Resync started");
                }
                ConsoleEvent::SyncCompleted {
                    pending,
                    accepted,
                    new_notifications,
                } => {
                    tracing::info!(pending, accepted, new_notifications, "Resync completed");
                }
                ConsoleEvent::SyncFailed { message } => {
                    tracing::warn!(%message, "Resync failed");
                }
                ConsoleEvent::TransitionSucceeded { kind, id } => {
                    tracing::info!(%kind, %id, "Transition succeeded");
                }
                ConsoleEvent::TransitionFailed { kind, id, message } => {
                    tracing::warn!(%kind, %id, %message, "Transition failed");
                }
            }
        }
    });

    let poll_loop = {
        let poller = Arc::clone(&poller);
        tokio::spawn(async move {
            poller.run(Duration::from_secs(interval_secs)).await;
        })
    };

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }

    poller.shutdown();
    let _ = poll_loop.await;
    event_logger.abort();

    tracing::info!("Frostdesk console stopped");
}
