//! # Sync Agent
//!
//! Runs the replication cycle on a fixed interval and on demand.
//!
//! ## Agent Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncAgent Architecture                           │
//! │                                                                         │
//! │  SyncAgentHandle ── SyncNow / Shutdown ──┐                             │
//! │                                           ▼                             │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  run loop: select! { interval tick | command }                   │  │
//! │  │                                                                  │  │
//! │  │     cycle:  pull() ── applied? ──► emitter.emit_refresh()        │  │
//! │  │               │                                                  │  │
//! │  │               ├── unavailable ──► status only, no push           │  │
//! │  │               ▼                                                  │  │
//! │  │             push()                                               │  │
//! │  │               ▼                                                  │  │
//! │  │             status ──► emitter.emit_status()                     │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Failures never stop the loop. The next tick simply tries again.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{SyncConfig, SyncMode};
use crate::error::{SyncError, SyncResult, Unavailable};
use crate::replication::ReplicationService;

// =============================================================================
// Sync Status
// =============================================================================

/// Where the agent stands after its latest cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// No cycle has run yet.
    #[default]
    Idle,
    /// Last cycle reached the cloud.
    Synced,
    /// Cloud unreachable.
    Offline,
    /// No linking code.
    NotLinked,
    /// Sync mode is offline.
    Disabled,
    /// Last cycle failed for another reason.
    Error,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::Synced => write!(f, "synced"),
            SyncState::Offline => write!(f, "offline"),
            SyncState::NotLinked => write!(f, "not linked"),
            SyncState::Disabled => write!(f, "disabled"),
            SyncState::Error => write!(f, "error"),
        }
    }
}

impl From<Unavailable> for SyncState {
    fn from(reason: Unavailable) -> Self {
        match reason {
            Unavailable::NotLinked => SyncState::NotLinked,
            Unavailable::Offline => SyncState::Offline,
            Unavailable::Disabled => SyncState::Disabled,
        }
    }
}

/// Current sync status for external queries.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    pub state: SyncState,

    pub mode: SyncMode,

    /// Cycles run since start.
    pub cycles: u64,

    /// When the latest cycle finished.
    pub last_cycle_at: Option<DateTime<Utc>>,

    /// Timestamp of the latest successful push.
    pub last_push_ts: Option<i64>,

    /// When a pull last changed local data.
    pub last_applied_at: Option<DateTime<Utc>>,

    /// Last error message (if any).
    pub last_error: Option<String>,
}

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleOutcome {
    /// The pull replaced local data.
    pub applied: bool,

    /// Timestamp of the snapshot pushed, if the push went through.
    pub pushed: Option<i64>,

    /// Set when the cycle was a no-op because sync is unavailable.
    pub unavailable: Option<Unavailable>,

    pub errors: Vec<String>,
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives sync events for whatever front end is attached.
pub trait SyncEventEmitter: Send + Sync {
    /// Status after each cycle.
    fn emit_status(&self, status: &SyncStatus);

    /// A pull replaced local data; views should reload.
    fn emit_refresh(&self);

    /// A cycle step failed.
    fn emit_error(&self, message: &str, retryable: bool);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_status(&self, _status: &SyncStatus) {}
    fn emit_refresh(&self) {}
    fn emit_error(&self, _message: &str, _retryable: bool) {}
}

/// Emitter that writes events to the tracing log.
pub struct LogEmitter;

impl SyncEventEmitter for LogEmitter {
    fn emit_status(&self, status: &SyncStatus) {
        debug!(state = %status.state, cycles = status.cycles, "Sync status");
    }

    fn emit_refresh(&self) {
        info!("Local data replaced by a newer snapshot");
    }

    fn emit_error(&self, message: &str, retryable: bool) {
        warn!(retryable, "Sync error: {}", message);
    }
}

// =============================================================================
// Sync Agent
// =============================================================================

enum AgentCommand {
    SyncNow(oneshot::Sender<CycleOutcome>),
    Shutdown,
}

/// Periodic pull-then-push driver.
pub struct SyncAgent {
    config: Arc<SyncConfig>,
    service: ReplicationService,
    status: Arc<RwLock<SyncStatus>>,
    emitter: Arc<dyn SyncEventEmitter>,
}

impl SyncAgent {
    /// Creates a new sync agent.
    pub fn new(config: SyncConfig, service: ReplicationService) -> Self {
        Self::with_emitter(config, service, Arc::new(NoOpEmitter))
    }

    /// Creates a new sync agent with a custom event emitter.
    pub fn with_emitter(
        config: SyncConfig,
        service: ReplicationService,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> Self {
        let status = SyncStatus {
            mode: config.sync.mode,
            ..Default::default()
        };

        SyncAgent {
            service: service.with_mode(config.sync.mode),
            config: Arc::new(config),
            status: Arc::new(RwLock::new(status)),
            emitter,
        }
    }

    /// Returns the current sync status.
    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    /// Runs one pull-then-push cycle and updates the status.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();

        match self.service.pull().await {
            Ok(applied) => {
                outcome.applied = applied;
                if applied {
                    self.emitter.emit_refresh();
                }
            }
            Err(SyncError::SyncUnavailable(reason)) => {
                debug!(%reason, "Sync cycle skipped");
                outcome.unavailable = Some(reason);
            }
            Err(e) => self.record_error(&mut outcome, "pull", e),
        }

        if outcome.unavailable.is_none() {
            match self.service.push().await {
                Ok(ts) => outcome.pushed = Some(ts),
                Err(SyncError::SyncUnavailable(reason)) => outcome.unavailable = Some(reason),
                Err(e) => self.record_error(&mut outcome, "push", e),
            }
        }

        let status = {
            let mut s = self.status.write().await;
            s.cycles += 1;
            s.last_cycle_at = Some(Utc::now());
            s.state = match (outcome.unavailable, outcome.errors.is_empty()) {
                (Some(reason), _) => reason.into(),
                (None, false) => SyncState::Error,
                (None, true) => SyncState::Synced,
            };
            if outcome.applied {
                s.last_applied_at = s.last_cycle_at;
            }
            if let Some(ts) = outcome.pushed {
                s.last_push_ts = Some(ts);
            }
            s.last_error = outcome.errors.last().cloned();
            s.clone()
        };
        self.emitter.emit_status(&status);

        outcome
    }

    fn record_error(&self, outcome: &mut CycleOutcome, step: &str, err: SyncError) {
        let retryable = err.is_retryable();
        let message = format!("{} failed: {}", step, err);
        warn!(step, retryable, error = %err, "Sync step failed");
        self.emitter.emit_error(&message, retryable);
        outcome.errors.push(message);
    }

    /// Spawns the loop and returns a handle to control it.
    ///
    /// In `offline` mode the loop still runs so `sync_now` answers, but
    /// every cycle reports `Disabled`.
    pub fn start(self) -> SyncAgentHandle {
        let (command_tx, command_rx) = mpsc::channel(8);
        let status = self.status.clone();

        info!(
            mode = %self.config.mode(),
            interval_secs = self.config.sync.interval_secs,
            device = %self.config.device.name,
            "Starting sync agent"
        );

        tokio::spawn(self.run(command_rx));

        SyncAgentHandle { command_tx, status }
    }

    async fn run(self, mut command_rx: mpsc::Receiver<AgentCommand>) {
        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }

                command = command_rx.recv() => match command {
                    Some(AgentCommand::SyncNow(reply)) => {
                        let outcome = self.run_cycle().await;
                        let _ = reply.send(outcome);
                    }
                    Some(AgentCommand::Shutdown) | None => {
                        info!("Sync agent received shutdown");
                        break;
                    }
                },
            }
        }

        info!("Sync agent stopped");
    }
}

// =============================================================================
// Agent Handle (for external control)
// =============================================================================

/// Handle for controlling a running SyncAgent from outside.
#[derive(Clone)]
pub struct SyncAgentHandle {
    command_tx: mpsc::Sender<AgentCommand>,
    status: Arc<RwLock<SyncStatus>>,
}

impl SyncAgentHandle {
    /// Gets the current sync status.
    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    /// Runs a cycle now, outside the interval, and waits for it.
    pub async fn sync_now(&self) -> SyncResult<CycleOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(AgentCommand::SyncNow(reply_tx))
            .await
            .map_err(|_| SyncError::ShuttingDown)?;
        reply_rx
            .await
            .map_err(|_| SyncError::ChannelError("Sync reply dropped".into()))
    }

    /// Signals the agent to shut down gracefully.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(AgentCommand::Shutdown).await;
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for creating SyncAgent with options.
pub struct SyncAgentBuilder {
    config: SyncConfig,
    service: Option<ReplicationService>,
    emitter: Option<Arc<dyn SyncEventEmitter>>,
}

impl SyncAgentBuilder {
    pub fn new(config: SyncConfig) -> Self {
        SyncAgentBuilder {
            config,
            service: None,
            emitter: None,
        }
    }

    pub fn with_service(mut self, service: ReplicationService) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn build(self) -> SyncResult<SyncAgent> {
        let service = self
            .service
            .ok_or_else(|| SyncError::InvalidConfig("Replication service required".into()))?;

        let emitter = self.emitter.unwrap_or_else(|| Arc::new(NoOpEmitter));

        Ok(SyncAgent::with_emitter(self.config, service, emitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::MemoryCloudSlot;
    use frigo_db::{Database, DbConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEmitter {
        refreshes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl SyncEventEmitter for CountingEmitter {
        fn emit_status(&self, _status: &SyncStatus) {}
        fn emit_refresh(&self) {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
        }
        fn emit_error(&self, _message: &str, _retryable: bool) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn service(cloud: &MemoryCloudSlot, device: &str) -> ReplicationService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.collections().init().await.unwrap();
        ReplicationService::new(db, Arc::new(cloud.clone())).with_device_id(Some(device.into()))
    }

    #[test]
    fn test_sync_status_default() {
        let status = SyncStatus::default();
        assert_eq!(status.state, SyncState::Idle);
        assert_eq!(status.cycles, 0);
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn test_unlinked_cycle_is_a_noop() {
        let cloud = MemoryCloudSlot::new();
        let agent = SyncAgent::new(SyncConfig::default(), service(&cloud, "a").await);

        let outcome = agent.run_cycle().await;
        assert_eq!(outcome.unavailable, Some(Unavailable::NotLinked));
        assert!(outcome.pushed.is_none());
        assert_eq!(agent.status().await.state, SyncState::NotLinked);
    }

    #[tokio::test]
    async fn test_cycle_pulls_then_pushes() {
        let cloud = MemoryCloudSlot::new();
        let a = service(&cloud, "a").await;
        let b = service(&cloud, "b").await;
        a.link("AB12").await.unwrap();
        b.link("AB12").await.unwrap();
        a.push().await.unwrap();

        let emitter = Arc::new(CountingEmitter::default());
        let agent = SyncAgentBuilder::new(SyncConfig::default())
            .with_service(b)
            .with_emitter(emitter.clone())
            .build()
            .unwrap();

        let first = agent.run_cycle().await;
        assert!(first.applied);
        assert!(first.pushed.is_some());
        assert_eq!(emitter.refreshes.load(Ordering::SeqCst), 1);

        // b's own push is already under its watermark
        let second = agent.run_cycle().await;
        assert!(!second.applied);

        let status = agent.status().await;
        assert_eq!(status.state, SyncState::Synced);
        assert_eq!(status.cycles, 2);
        assert_eq!(status.last_push_ts, second.pushed);
    }

    #[tokio::test]
    async fn test_offline_cycle_reports_offline() {
        let cloud = MemoryCloudSlot::new();
        let a = service(&cloud, "a").await;
        a.link("AB12").await.unwrap();
        cloud.set_online(false);

        let agent = SyncAgent::new(SyncConfig::default(), a);
        let outcome = agent.run_cycle().await;
        assert_eq!(outcome.unavailable, Some(Unavailable::Offline));
        assert_eq!(agent.status().await.state, SyncState::Offline);
    }

    #[tokio::test]
    async fn test_handle_sync_now_and_shutdown() {
        let cloud = MemoryCloudSlot::new();
        let a = service(&cloud, "a").await;
        a.link("AB12").await.unwrap();

        let mut config = SyncConfig::default();
        config.sync.interval_secs = 3600;
        let handle = SyncAgent::new(config, a).start();

        let outcome = handle.sync_now().await.unwrap();
        assert!(outcome.pushed.is_some());
        assert!(handle.status().await.cycles >= 1);

        handle.shutdown().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(handle.sync_now().await.is_err());
    }
}
