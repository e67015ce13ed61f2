//! Sync engine actor.
//!
//! A single task owns the [`Reconciler`] and applies every write: push
//! messages, poll results and selection changes all funnel through its
//! `select!` loop, so the snapshot has exactly one writer. Callers talk to
//! it through [`SyncHandle`].

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::poller::{FallbackPoller, PollUpdate};
use crate::status::SyncStatus;
use lotwatch_core::{LotId, Snapshot};
use lotwatch_feed::{ApplyOutcome, LotEvent, Origin, Reconciler, ReconcilerConfig};
use lotwatch_rest::ParkingApiClient;
use lotwatch_telemetry::Metrics;
use lotwatch_ws::{
    ClientMessage, ConnectionConfig, ConnectionManager, ConnectionState, ServerMessage,
    WsWriteHandle,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Requests from presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    SelectLot(LotId),
    ClearSelection,
    Refresh,
}

struct SyncEngineTask {
    reconciler: Reconciler,
    messages: mpsc::Receiver<ServerMessage>,
    polls: mpsc::Receiver<PollUpdate>,
    commands: mpsc::Receiver<SyncCommand>,
    connection: watch::Receiver<ConnectionState>,
    writer: WsWriteHandle,
    poller: FallbackPoller,
    selection: watch::Sender<Option<LotId>>,
    status: watch::Sender<SyncStatus>,
    shutdown: CancellationToken,
}

impl SyncEngineTask {
    async fn run(mut self) {
        debug!("Sync engine started");

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                Some(msg) = self.messages.recv() => self.on_push(msg),
                Some(update) = self.polls.recv() => self.on_poll(update),
                Some(cmd) = self.commands.recv() => self.on_command(cmd),
                Ok(()) = self.connection.changed() => {
                    let state = *self.connection.borrow_and_update();
                    self.on_connection(state);
                }
            }
        }

        debug!("Sync engine stopped");
    }

    fn on_push(&mut self, msg: ServerMessage) {
        let event = LotEvent::from(msg);
        let lots_write = matches!(event, LotEvent::ReplaceLots(_));
        if self.reconciler.apply(event, Origin::Push) == ApplyOutcome::Applied && lots_write {
            self.mark_loaded();
        }
    }

    fn on_poll(&mut self, update: PollUpdate) {
        match update {
            PollUpdate::Lots {
                ticket,
                endpoint,
                result,
            } => match result {
                Ok(lots) => {
                    match self
                        .reconciler
                        .apply(LotEvent::ReplaceLots(lots), Origin::Poll(ticket))
                    {
                        ApplyOutcome::Applied => self.mark_loaded(),
                        ApplyOutcome::Stale => Metrics::poll(endpoint, "stale"),
                        _ => {}
                    }
                }
                Err(e) => self.on_poll_error(e.to_string()),
            },
            PollUpdate::Spots {
                ticket,
                lot_id,
                result,
            } => {
                let spots = match result {
                    Ok(spots) => spots,
                    Err(e) => {
                        debug!(%lot_id, error = %e, "Spot poll failed, keeping last spots");
                        return;
                    }
                };
                if self.reconciler.requested_lot() != Some(lot_id) {
                    debug!(%lot_id, "Discarding spots for a lot no longer selected");
                    return;
                }
                let event = LotEvent::ReplaceSpots {
                    lot_id: Some(lot_id),
                    spots,
                };
                if self.reconciler.apply(event, Origin::Poll(ticket)) == ApplyOutcome::Stale {
                    Metrics::poll(crate::poller::SPOTS_ENDPOINT, "stale");
                }
            }
        }
    }

    /// Only a failure before anything loaded is surfaced.
    fn on_poll_error(&mut self, error: String) {
        let status = self.status.borrow().clone();
        if status.loaded {
            debug!(%error, "Poll failed after load, keeping last snapshot");
            return;
        }
        warn!(%error, "Initial load failed");
        self.status.send_replace(SyncStatus {
            load_error: Some(error),
            ..status
        });
    }

    fn mark_loaded(&mut self) {
        let status = self.status.borrow().clone();
        if status.loaded && status.load_error.is_none() {
            return;
        }
        if !status.loaded {
            info!(lots = self.reconciler.snapshot().lots.len(), "Initial snapshot loaded");
        }
        self.status.send_replace(SyncStatus {
            loaded: true,
            load_error: None,
            ..status
        });
    }

    fn on_command(&mut self, cmd: SyncCommand) {
        debug!(?cmd, "Sync command");
        match cmd {
            SyncCommand::SelectLot(lot_id) => {
                self.reconciler.track_lot(lot_id);
                self.selection.send_replace(Some(lot_id));
                self.request_spots(lot_id);
            }
            SyncCommand::ClearSelection => {
                self.reconciler.clear_selection();
                self.selection.send_replace(None);
            }
            SyncCommand::Refresh => {
                if !self.send_push(&ClientMessage::GetStatus) {
                    let poller = self.poller.clone();
                    self.spawn_fetch(async move { poller.tick().await });
                }
            }
        }
    }

    fn on_connection(&mut self, state: ConnectionState) {
        info!(%state, "Push channel state changed");
        let mut status = self.status.borrow().clone();
        status.connection = state;
        if state.is_live() {
            status.load_error = None;
        }
        self.status.send_replace(status);

        if state.is_live() {
            if let Some(lot_id) = self.reconciler.requested_lot() {
                self.send_push(&ClientMessage::GetLotSpots { lot_id });
            }
        }
    }

    /// Ask for spots over push if live, otherwise fetch them over REST now.
    fn request_spots(&mut self, lot_id: LotId) {
        if !self.send_push(&ClientMessage::GetLotSpots { lot_id }) {
            let poller = self.poller.clone();
            self.spawn_fetch(async move { poller.fetch_spots_once(lot_id).await });
        }
    }

    /// Returns `false` if the request could not be queued.
    ///
    /// Never waits for queue space: the connection loop may itself be
    /// waiting on this task to take inbound messages.
    fn send_push(&self, msg: &ClientMessage) -> bool {
        match self.writer.try_send(msg) {
            Ok(()) => true,
            Err(e) => {
                debug!(kind = msg.kind(), error = %e, "Push request not sent, using REST");
                false
            }
        }
    }

    /// Run a one-off fetch that is abandoned on teardown.
    fn spawn_fetch<F>(&self, fetch: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let cancel = self.shutdown.child_token();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = fetch => {}
            }
        });
    }
}

/// Handle to a running sync engine.
pub struct SyncHandle {
    commands: mpsc::Sender<SyncCommand>,
    snapshot: watch::Receiver<Arc<Snapshot>>,
    status: watch::Receiver<SyncStatus>,
    connection: Arc<ConnectionManager>,
    client: Arc<ParkingApiClient>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncHandle {
    /// Start the connection manager, the poller and the engine.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: SyncConfig, client: Arc<ParkingApiClient>) -> Self {
        let shutdown = CancellationToken::new();
        let capacity = config.channel_capacity.max(1);

        let (message_tx, message_rx) = mpsc::channel(capacity);
        let connection = Arc::new(ConnectionManager::with_shutdown_token(
            ConnectionConfig {
                url: config.ws_url.clone(),
                reconnect_delay_ms: config.reconnect_delay_ms,
                ..Default::default()
            },
            message_tx,
            shutdown.child_token(),
        ));

        let reconciler = Reconciler::new(ReconcilerConfig {
            discard_stale_polls: config.polling.discard_stale,
        });
        let snapshot = reconciler.subscribe();

        let (selection_tx, selection_rx) = watch::channel(None);
        let (poll_tx, poll_rx) = mpsc::channel(capacity);
        let poller = FallbackPoller::new(
            client.clone(),
            reconciler.clock(),
            connection.subscribe_state(),
            selection_rx,
            Duration::from_millis(config.polling.fallback_grace_ms),
            config.polling.filter_by_permit,
            config.polling.while_live,
            poll_tx,
        );

        let (command_tx, command_rx) = mpsc::channel(capacity);
        let (status_tx, status_rx) = watch::channel(SyncStatus::default());

        let connection_task = {
            let connection = connection.clone();
            tokio::spawn(async move {
                if let Err(e) = connection.connect().await {
                    error!(error = %e, "Connection manager exited");
                }
            })
        };

        let poll_task = poller.schedule_polling(
            Duration::from_millis(config.polling.interval_ms),
            shutdown.child_token(),
        );

        let engine = SyncEngineTask {
            reconciler,
            messages: message_rx,
            polls: poll_rx,
            commands: command_rx,
            connection: connection.subscribe_state(),
            writer: connection.write_handle(),
            poller,
            selection: selection_tx,
            status: status_tx,
            shutdown: shutdown.clone(),
        };
        let engine_task = tokio::spawn(engine.run());

        info!(
            ws_url = %config.ws_url,
            poll_interval_ms = config.polling.interval_ms,
            "Sync engine started"
        );

        Self {
            commands: command_tx,
            snapshot,
            status: status_rx,
            connection,
            client,
            shutdown,
            tasks: vec![connection_task, poll_task, engine_task],
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.clone()
    }

    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Push channel connection attempts so far.
    pub fn connection_attempts(&self) -> u64 {
        self.connection.attempts()
    }

    pub fn client(&self) -> &Arc<ParkingApiClient> {
        &self.client
    }

    pub async fn select_lot(&self, lot_id: LotId) -> SyncResult<()> {
        self.command(SyncCommand::SelectLot(lot_id)).await
    }

    pub async fn clear_selection(&self) -> SyncResult<()> {
        self.command(SyncCommand::ClearSelection).await
    }

    pub async fn refresh(&self) -> SyncResult<()> {
        self.command(SyncCommand::Refresh).await
    }

    async fn command(&self, cmd: SyncCommand) -> SyncResult<()> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| SyncError::EngineStopped)
    }

    /// Stop polling, cancel any pending reconnect, close the push channel
    /// and wait for every task to finish.
    pub async fn teardown(self) -> SyncResult<()> {
        info!("Sync teardown requested");
        self.shutdown.cancel();

        for task in self.tasks {
            task.await.map_err(|e| SyncError::TaskJoin(e.to_string()))?;
        }

        info!("Sync teardown complete");
        Ok(())
    }
}
