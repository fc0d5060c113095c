use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use anyhow::Result;
use shared::types::{ProtoRange, Snapshot};
use crate::source::{FetchError, ListSource};
use crate::view::digest::Fragment;
use crate::view::filter::{project, FilterState};
use crate::view::render::render;

/// Commands sent to the session task
pub enum SessionCommand {
    Get(oneshot::Sender<()>),
    Fetched {
        seq: u64,
        result: Result<Snapshot, FetchError>,
    },
    SetProtoRange(Option<ProtoRange>, oneshot::Sender<()>),
    ShowAll(oneshot::Sender<()>),
    Status(oneshot::Sender<SessionStatus>),
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub filter: FilterState,
    /// `None` until the first successful fetch
    pub fetched_at: Option<DateTime<Utc>>,
    pub servers: usize,
}

/// Owns the cached snapshot and the filter state. Every mutation happens on
/// the session task, one command at a time.
struct Session {
    source: Arc<dyn ListSource>,
    snapshot: Option<Snapshot>,
    filter: FilterState,
    mount: watch::Sender<Fragment>,
    tx: mpsc::WeakSender<SessionCommand>,
    /// Sequence number of the last dispatched fetch
    requested: u64,
    /// Sequence number of the snapshot currently held
    applied: u64,
}

impl Session {
    fn dispatch_fetch(&mut self) {
        self.requested += 1;
        let seq = self.requested;
        let fetch = self.source.fetch();
        let tx = self.tx.clone();

        tracing::debug!("Fetching server list (request {})", seq);
        tokio::spawn(async move {
            let result = fetch.await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(SessionCommand::Fetched { seq, result }).await;
            }
        });
    }

    fn fetched(&mut self, seq: u64, result: Result<Snapshot, FetchError>) {
        match result {
            Ok(snapshot) if seq > self.applied => {
                tracing::debug!("Received {} servers (request {})", snapshot.list.len(), seq);
                self.applied = seq;
                self.snapshot = Some(snapshot);
                self.draw();
            }
            Ok(_) => {
                tracing::debug!("Discarding response {} older than {}", seq, self.applied);
            }
            Err(e) => {
                tracing::warn!("Failed to fetch server list: {}", e);
            }
        }
    }

    fn draw(&self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let view = project(snapshot, &self.filter);
        tracing::trace!(
            "Drawing {} of {} servers",
            view.records.len(),
            snapshot.list.len()
        );
        self.mount.send_replace(Fragment::new(render(&view)));
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            filter: self.filter.clone(),
            fetched_at: self.snapshot.as_ref().map(|s| s.fetched_at),
            servers: self.snapshot.as_ref().map_or(0, |s| s.list.len()),
        }
    }
}

/// Handle to the session task
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Spawn the session task. Rendered output is published on `mount`.
    pub fn spawn(
        source: Arc<dyn ListSource>,
        filter: FilterState,
        mount: watch::Sender<Fragment>,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<SessionCommand>(256);
        let mut session = Session {
            source,
            snapshot: None,
            filter,
            mount,
            tx: tx.downgrade(),
            requested: 0,
            applied: 0,
        };

        tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    SessionCommand::Get(reply) => {
                        session.dispatch_fetch();
                        let _ = reply.send(());
                    }
                    SessionCommand::Fetched { seq, result } => {
                        session.fetched(seq, result);
                    }
                    SessionCommand::SetProtoRange(range, reply) => {
                        tracing::debug!("Protocol range set to {:?}", range);
                        session.filter.proto_range = range;
                        session.draw();
                        let _ = reply.send(());
                    }
                    SessionCommand::ShowAll(reply) => {
                        session.filter.min_clients = None;
                        session.filter.limit = None;
                        session.dispatch_fetch();
                        let _ = reply.send(());
                    }
                    SessionCommand::Status(reply) => {
                        let _ = reply.send(session.status());
                    }
                    SessionCommand::Shutdown => {
                        tracing::info!("Session shutting down");
                        break;
                    }
                }
            }
        });

        Self { tx }
    }

    /// Start one fetch of the list. Returns once the request is dispatched;
    /// the snapshot and mount are updated when the response arrives.
    pub async fn get(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(SessionCommand::Get(reply)).await?;
        Ok(rx.await?)
    }

    /// Fetch now and, unless `no_refresh`, every `period` after that.
    pub async fn loaded(
        &self,
        no_refresh: bool,
        period: Duration,
        cancel: CancellationToken,
    ) -> Result<Option<JoinHandle<()>>> {
        self.get().await?;
        if no_refresh {
            tracing::info!("Periodic refresh disabled");
            return Ok(None);
        }

        let session = self.clone();
        Ok(Some(tokio::spawn(async move {
            if let Err(e) = run_refresh(session, period, cancel).await {
                tracing::error!("Refresh loop error: {}", e);
            }
        })))
    }

    /// Clear `min_clients` and `limit`, then refetch.
    pub async fn show_all(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(SessionCommand::ShowAll(reply)).await?;
        Ok(rx.await?)
    }

    /// Replace the protocol filter and redraw from the cached snapshot.
    pub async fn set_proto_range(&self, range: Option<ProtoRange>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(SessionCommand::SetProtoRange(range, reply)).await?;
        Ok(rx.await?)
    }

    pub async fn status(&self) -> Result<SessionStatus> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(SessionCommand::Status(reply)).await?;
        Ok(rx.await?)
    }

    /// Stop the session task
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(SessionCommand::Shutdown).await?;
        Ok(())
    }
}

/// Refresh loop: one `get` per period until cancelled.
async fn run_refresh(
    session: SessionHandle,
    period: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                session.get().await?;
            }
            _ = cancel.cancelled() => {
                tracing::info!("Refresh loop shutting down");
                break;
            }
        }
    }

    Ok(())
}
