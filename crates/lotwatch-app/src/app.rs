//! Main application orchestration.
//!
//! Logs in if configured, loads today's restriction events, starts the sync
//! engine and logs every snapshot it publishes until Ctrl-C.

use crate::config::AppConfig;
use crate::error::AppResult;
use lotwatch_core::{LayoutVariant, LotSummary, Snapshot};
use lotwatch_rest::{is_lot_restricted, ActiveEvent, ParkingApiClient, Session};
use lotwatch_sync::{SyncHandle, SyncStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub async fn run(self) -> AppResult<()> {
        let session = Arc::new(Session::new());
        let client = Arc::new(ParkingApiClient::new(
            self.config.api_url.clone(),
            session,
        )?);

        if let Some(auth) = self.config.credentials() {
            login(&client, &auth.username, &auth.password).await;
        }

        let events = match client.fetch_active_events().await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Failed to fetch active events");
                Vec::new()
            }
        };
        log_events(&events);

        let sync = SyncHandle::start(self.config.sync_config(), client);
        if let Some(lot_id) = self.config.select_lot {
            sync.select_lot(lot_id).await?;
        }

        let mut snapshots = sync.subscribe();
        let mut status = sync.status();

        info!("Entering main event loop");
        loop {
            tokio::select! {
                Ok(()) = snapshots.changed() => {
                    let snapshot = snapshots.borrow_and_update().clone();
                    log_snapshot(&snapshot, &events);
                }
                Ok(()) = status.changed() => {
                    let current = status.borrow_and_update().clone();
                    log_status(&current);
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        sync.teardown().await?;
        Ok(())
    }
}

async fn login(client: &ParkingApiClient, username: &str, password: &str) {
    if let Err(e) = client.login(username, password).await {
        warn!(username, error = %e, "Login failed, continuing anonymously");
        return;
    }

    match client.fetch_profile().await {
        Ok(profile) => info!(
            name = profile.display_name(),
            permit = ?profile.permit_type.as_ref().map(|p| p.name.as_str()),
            vehicles = profile.vehicles.len(),
            "Profile loaded"
        ),
        Err(e) => warn!(error = %e, "Failed to fetch profile"),
    }
}

fn log_events(events: &[ActiveEvent]) {
    for event in events {
        let lots: Vec<&str> = event
            .restricted_lots
            .iter()
            .map(|l| l.parking_lot_name.as_str())
            .collect();
        warn!(event = %event.event_name, restricted = ?lots, "Active event restricts lots");
    }
}

fn log_status(status: &SyncStatus) {
    match &status.load_error {
        Some(error) => warn!(connection = %status.connection, %error, "Unable to load occupancy"),
        None => info!(
            connection = %status.connection,
            loaded = status.loaded,
            "Sync status"
        ),
    }
}

fn log_snapshot(snapshot: &Snapshot, events: &[ActiveEvent]) {
    info!(
        lots = snapshot.lots.len(),
        available = snapshot.total_available(),
        last_updated = ?snapshot.last_updated,
        "Snapshot"
    );
    for lot in &snapshot.lots {
        debug!("{}", describe_lot(lot, events));
    }
    if let Some(view) = &snapshot.spot_view {
        info!(
            lot_id = %view.lot_id,
            spots = view.spots.len(),
            available = view.available_count(),
            layout = %LayoutVariant::for_lot(view.lot_id),
            "Spot view"
        );
    }
}

/// One-line summary of a lot.
pub fn describe_lot(lot: &LotSummary, events: &[ActiveEvent]) -> String {
    let mut line = format!(
        "{} #{}: {}/{} available ({:.1}% full)",
        lot.name, lot.id, lot.available_spots, lot.total_spots, lot.occupancy_percent
    );
    if !lot.is_consistent() {
        line.push_str(" [inconsistent]");
    }
    if is_lot_restricted(events, lot.id) {
        line.push_str(" [restricted]");
    }
    line
}
