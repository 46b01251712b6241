use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::filters::buffer::FilterBuffer;
use crate::filters::store::{ActiveSource, DoubleBufferStore};
use crate::models::config::Credentials;
use crate::offload::{FilterEngine, LinkError, NetworkLink};

/// Reasons a commit attempt did not end in `Committed`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("pending filter list overflowed its capacity")]
    ListFull,

    #[error("link teardown failed: {0}")]
    LinkTeardownFailed(LinkError),

    /// The new list is active, only the association is missing
    #[error("association failed after commit: {0}")]
    AssociationFailed(LinkError),
}

/// Steps of a commit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitState {
    Idle,
    Validating,
    Disconnecting,
    Swapping,
    Reinitializing,
    Reconnecting,
    Committed,
    Failed(CommitError),
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitState::Idle => write!(f, "idle"),
            CommitState::Validating => write!(f, "validating"),
            CommitState::Disconnecting => write!(f, "disconnecting"),
            CommitState::Swapping => write!(f, "swapping"),
            CommitState::Reinitializing => write!(f, "reinitializing"),
            CommitState::Reconnecting => write!(f, "reconnecting"),
            CommitState::Committed => write!(f, "committed"),
            CommitState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome of a successful commit
#[derive(Debug, Clone, Serialize)]
pub struct CommitReport {
    /// Attempt id, also found in the log lines of the attempt
    pub id: Uuid,

    pub restored_defaults: bool,

    pub active_source: ActiveSource,

    pub active_filters: usize,

    /// Disconnect reported an error but the link did go down
    #[serde(serialize_with = "serialize_error")]
    pub teardown_warning: Option<CommitError>,
}

fn serialize_error<S: Serializer>(error: &Option<CommitError>, s: S) -> Result<S::Ok, S::Error> {
    error.as_ref().map(ToString::to_string).serialize(s)
}

/// Published view of the commit progress
#[derive(Debug, Clone, Serialize)]
pub struct CommitStatus {
    /// Current state of the controller
    pub state: String,

    /// Id of the latest attempt
    pub attempt: Option<Uuid>,

    /// Start of the latest attempt
    pub started_at: Option<DateTime<Utc>>,

    /// End of the latest attempt
    pub finished_at: Option<DateTime<Utc>>,

    /// Error of the latest attempt, if it failed
    pub last_error: Option<String>,

    /// Attempts that ended in `Committed`
    pub commits: u64,
}

impl Default for CommitStatus {
    fn default() -> Self {
        Self {
            state: CommitState::Idle.to_string(),
            attempt: None,
            started_at: None,
            finished_at: None,
            last_error: None,
            commits: 0,
        }
    }
}

/// Handle on the commit status, readable while a commit is running
#[derive(Debug, Clone, Default)]
pub struct CommitMonitor {
    status: Arc<RwLock<CommitStatus>>,
}

impl CommitMonitor {
    pub fn snapshot(&self) -> CommitStatus {
        self.status.read().clone()
    }

    fn begin(&self, attempt: Uuid) {
        let mut status = self.status.write();
        status.attempt = Some(attempt);
        status.started_at = Some(Utc::now());
        status.finished_at = None;
        status.last_error = None;
    }

    fn set_state(&self, state: &CommitState) {
        self.status.write().state = state.to_string();
    }

    fn finish(&self, error: Option<&CommitError>) {
        let mut status = self.status.write();
        status.finished_at = Some(Utc::now());
        match error {
            Some(error) => status.last_error = Some(error.to_string()),
            None => status.commits += 1,
        }
    }
}

/// Runs the commit protocol against the link and the filtering engine.
///
/// The engine reads the active list until the link is down, so the swap
/// only happens between a confirmed disconnect and the engine restart.
pub struct CommitController {
    link: Box<dyn NetworkLink>,
    engine: Box<dyn FilterEngine>,
    credentials: Credentials,
    state: CommitState,
    trace: Vec<CommitState>,
    monitor: CommitMonitor,
}

impl CommitController {
    pub fn new(
        link: Box<dyn NetworkLink>,
        engine: Box<dyn FilterEngine>,
        credentials: Credentials,
    ) -> Self {
        Self {
            link,
            engine,
            credentials,
            state: CommitState::Idle,
            trace: Vec::new(),
            monitor: CommitMonitor::default(),
        }
    }

    /// Boot the engine with the active list and associate
    pub fn start(&mut self, active: &FilterBuffer) -> Result<(), CommitError> {
        self.engine.reinitialize(active);
        self.link.connect(&self.credentials).map_err(|e| {
            warn!("Initial association failed: {}", e);
            CommitError::AssociationFailed(e)
        })
    }

    /// Promote the pending list, or the factory defaults when `restore` is set.
    ///
    /// Validating, disconnecting, swapping, reinitializing and reconnecting
    /// happen in that order. On `AssociationFailed` the swap is kept.
    pub fn commit(
        &mut self,
        store: &mut DoubleBufferStore,
        restore: bool,
    ) -> Result<CommitReport, CommitError> {
        let attempt = Uuid::new_v4();
        self.trace.clear();
        self.monitor.begin(attempt);
        self.transition(CommitState::Idle);
        info!(
            "[{}] Committing {} pending filters{}",
            attempt,
            store.pending().len(),
            if restore { " (restoring factory defaults)" } else { "" }
        );

        let result = self.run(store, restore, attempt);
        match &result {
            Ok(report) => {
                self.transition(CommitState::Committed);
                info!(
                    "[{}] Committed, {} filters active",
                    attempt, report.active_filters
                );
            }
            Err(e) => {
                self.transition(CommitState::Failed(e.clone()));
                let path: Vec<String> = self.transitions().iter().map(ToString::to_string).collect();
                error!("[{}] Commit failed: {} ({})", attempt, e, path.join(" -> "));
            }
        }
        self.monitor.finish(result.as_ref().err());
        result
    }

    fn run(
        &mut self,
        store: &mut DoubleBufferStore,
        restore: bool,
        attempt: Uuid,
    ) -> Result<CommitReport, CommitError> {
        self.transition(CommitState::Validating);
        let pending = store.get_pending();
        if pending.is_overflowed() {
            return Err(CommitError::ListFull);
        }
        pending.terminate();

        self.transition(CommitState::Disconnecting);
        let teardown_warning = match self.link.disconnect() {
            Ok(()) => None,
            Err(e) => {
                warn!("[{}] Disconnect reported an error: {}", attempt, e);
                Some(CommitError::LinkTeardownFailed(e))
            }
        };
        if !self.link.is_disconnected() {
            return Err(teardown_warning.unwrap_or(CommitError::LinkTeardownFailed(
                LinkError::StillAssociated,
            )));
        }

        self.transition(CommitState::Swapping);
        let retired = store.swap_pending_to_active();
        debug!(
            "[{}] Released {} filters, buffer {} is now pending",
            attempt,
            retired.len(),
            store.pending_index()
        );
        if restore {
            store.activate_factory_defaults();
        }

        self.transition(CommitState::Reinitializing);
        let active = store.get_active();
        self.engine.reinitialize(active);
        let active_filters = active.len();

        self.transition(CommitState::Reconnecting);
        self.link
            .connect(&self.credentials)
            .map_err(CommitError::AssociationFailed)?;

        Ok(CommitReport {
            id: attempt,
            restored_defaults: restore,
            active_source: store.active_source(),
            active_filters,
            teardown_warning,
        })
    }

    fn transition(&mut self, state: CommitState) {
        debug!("Commit state: {} -> {}", self.state(), state);
        self.monitor.set_state(&state);
        self.trace.push(state.clone());
        self.state = state;
    }

    pub fn state(&self) -> &CommitState {
        &self.state
    }

    /// States visited by the latest attempt
    pub fn transitions(&self) -> &[CommitState] {
        &self.trace
    }

    pub fn monitor(&self) -> CommitMonitor {
        self.monitor.clone()
    }

    pub fn engine(&self) -> &dyn FilterEngine {
        self.engine.as_ref()
    }
}
