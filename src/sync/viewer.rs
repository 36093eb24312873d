//! Read-only polling viewer.
//!
//! Viewers are never pushed updates; they re-fetch the stored bracket on a
//! fixed interval and publish the latest snapshot through a `watch`
//! channel. Only one fetch is ever in flight: a fetch slower than the
//! interval skips ticks instead of piling up requests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};

use crate::bracket::BracketPayload;
use crate::db::{StoreError, TournamentStore};
use crate::roster::TournamentId;

/// Default polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// The latest state a viewer has observed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BracketSnapshot {
    /// The stored bracket; `None` until one is generated (or after a
    /// reset). Absent, empty, or misshapen store payloads all land here
    /// as `None` rather than errors.
    pub bracket: Option<BracketPayload>,

    /// When the snapshot was last refreshed; `None` before the first
    /// successful fetch.
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Handle to a running [`BracketViewer`].
///
/// Dropping the handle also stops the viewer: the polling loop exits when
/// its control channel closes.
pub struct ViewerHandle {
    shutdown: mpsc::Sender<()>,
    snapshot: watch::Receiver<BracketSnapshot>,
}

impl ViewerHandle {
    /// The most recent snapshot.
    pub fn snapshot(&self) -> BracketSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<BracketSnapshot> {
        self.snapshot.clone()
    }

    /// Stop the viewer. The task exits on its next loop turn.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(()).await;
    }
}

/// Periodic read-only poller for one tournament's stored bracket.
pub struct BracketViewer {
    store: Arc<dyn TournamentStore>,
    tournament_id: TournamentId,
    poll_interval: Duration,
    shutdown: mpsc::Receiver<()>,
    snapshot: watch::Sender<BracketSnapshot>,
}

impl BracketViewer {
    /// Create a viewer and its handle; the caller spawns
    /// [`BracketViewer::run`].
    pub fn new(
        store: Arc<dyn TournamentStore>,
        tournament_id: TournamentId,
        poll_interval: Duration,
    ) -> (Self, ViewerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (snapshot_tx, snapshot_rx) = watch::channel(BracketSnapshot::default());

        let viewer = Self {
            store,
            tournament_id,
            poll_interval,
            shutdown: shutdown_rx,
            snapshot: snapshot_tx,
        };
        let handle = ViewerHandle {
            shutdown: shutdown_tx,
            snapshot: snapshot_rx,
        };
        (viewer, handle)
    }

    /// Run the polling loop until the handle stops it or is dropped.
    ///
    /// The first fetch happens immediately; after that the loop ticks at
    /// the configured interval, skipping ticks that elapse while a fetch
    /// is still in flight.
    pub async fn run(mut self) {
        info!(
            "tournament {}: viewer polling every {:?}",
            self.tournament_id, self.poll_interval
        );
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.refresh().await,
                _ = self.shutdown.recv() => break,
            }
        }

        info!("tournament {}: viewer stopped", self.tournament_id);
    }

    async fn refresh(&mut self) {
        match self.store.fetch_bracket(self.tournament_id).await {
            Ok(stored) => {
                let bracket = stored.filter(BracketPayload::is_populated);
                let _ = self.snapshot.send_replace(BracketSnapshot {
                    bracket,
                    fetched_at: Some(Utc::now()),
                });
            }
            Err(StoreError::Serialization(err)) => {
                // a misshapen stored payload reads as "no bracket yet"
                warn!(
                    "tournament {}: stored bracket is malformed ({err}), treating as absent",
                    self.tournament_id
                );
                let _ = self.snapshot.send_replace(BracketSnapshot {
                    bracket: None,
                    fetched_at: Some(Utc::now()),
                });
            }
            Err(err) => {
                // keep the previous snapshot; the next tick retries
                warn!(
                    "tournament {}: bracket fetch failed: {err}",
                    self.tournament_id
                );
            }
        }
    }
}
