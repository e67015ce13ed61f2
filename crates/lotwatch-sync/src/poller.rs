//! Fallback poller.
//!
//! Fetches full state over REST on a fixed interval and hands the results
//! to the engine, which merges them through the same reconciler as push
//! messages. Every result carries the [`PollTicket`] taken before its
//! request went out.

use lotwatch_core::{LotId, LotSummary, SpotState};
use lotwatch_feed::{PollTicket, SequenceClock};
use lotwatch_rest::{ParkingApiClient, RestResult};
use lotwatch_telemetry::Metrics;
use lotwatch_ws::ConnectionState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const DASHBOARD_ENDPOINT: &str = "dashboard";
pub const PERMIT_ENDPOINT: &str = "for_my_permit";
pub const SPOTS_ENDPOINT: &str = "spots";

/// Result of one pull request.
#[derive(Debug)]
pub enum PollUpdate {
    Lots {
        ticket: PollTicket,
        endpoint: &'static str,
        result: RestResult<Vec<LotSummary>>,
    },
    Spots {
        ticket: PollTicket,
        lot_id: LotId,
        result: RestResult<Vec<SpotState>>,
    },
}

#[derive(Clone)]
pub struct FallbackPoller {
    client: Arc<ParkingApiClient>,
    clock: SequenceClock,
    connection: watch::Receiver<ConnectionState>,
    selection: watch::Receiver<Option<LotId>>,
    started: Instant,
    grace: Duration,
    filter_by_permit: bool,
    while_live: bool,
    tx: mpsc::Sender<PollUpdate>,
}

impl FallbackPoller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Arc<ParkingApiClient>,
        clock: SequenceClock,
        connection: watch::Receiver<ConnectionState>,
        selection: watch::Receiver<Option<LotId>>,
        grace: Duration,
        filter_by_permit: bool,
        while_live: bool,
        tx: mpsc::Sender<PollUpdate>,
    ) -> Self {
        Self {
            client,
            clock,
            connection,
            selection,
            started: Instant::now(),
            grace,
            filter_by_permit,
            while_live,
            tx,
        }
    }

    /// Poll every `interval` until `cancel` fires. The first tick is immediate.
    pub fn schedule_polling(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            () = cancel.cancelled() => break,
                            () = poller.tick() => {}
                        }
                    }
                }
            }
            debug!("Fallback poller stopped");
        })
    }

    /// Whether the push channel has taken over spot refreshes.
    fn grace_over_and_live(&self) -> bool {
        self.connection.borrow().is_live() && self.started.elapsed() >= self.grace
    }

    /// One poll: the lot list, then the selected lot's spots if push has not
    /// taken over.
    pub async fn tick(&self) {
        let live_after_grace = self.grace_over_and_live();

        if self.while_live || !live_after_grace {
            self.fetch_lots_once().await;
        }

        let selected = *self.selection.borrow();
        if let Some(lot_id) = selected {
            if !live_after_grace {
                self.fetch_spots_once(lot_id).await;
            }
        }
    }

    /// Fetch the full lot list once.
    pub async fn fetch_lots_once(&self) {
        let ticket = self.clock.ticket();
        let permit = self.filter_by_permit && self.client.session().is_active();

        let (endpoint, result) = if permit {
            (PERMIT_ENDPOINT, self.client.fetch_lots_for_permit().await)
        } else {
            (DASHBOARD_ENDPOINT, self.client.fetch_dashboard().await)
        };
        record(endpoint, &result);

        self.send(PollUpdate::Lots {
            ticket,
            endpoint,
            result,
        })
        .await;
    }

    /// Fetch one lot's spots once.
    pub async fn fetch_spots_once(&self, lot_id: LotId) {
        let ticket = self.clock.ticket();
        let result = self.client.fetch_spots(lot_id).await;
        record(SPOTS_ENDPOINT, &result);

        self.send(PollUpdate::Spots {
            ticket,
            lot_id,
            result,
        })
        .await;
    }

    async fn send(&self, update: PollUpdate) {
        if self.tx.send(update).await.is_err() {
            debug!("Poll receiver dropped");
        }
    }
}

fn record<T>(endpoint: &str, result: &RestResult<T>) {
    match result {
        Ok(_) => Metrics::poll(endpoint, "ok"),
        Err(e) => {
            Metrics::poll(endpoint, "error");
            warn!(endpoint, error = %e, "Poll request failed");
        }
    }
}
