use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::catalog::FormCatalog;
use super::state::{FormError, FormSnapshot, FormStore};
use super::submission::{SubmissionController, SubmissionOutcome, SubmissionSink};

/// Identifier of one mounted form instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub snapshot: FormSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
    pub snapshot: FormSnapshot,
}

/// Bounds on how many instances are kept and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Instances with no event for longer than this are discarded.
    pub idle_ttl: Duration,
    /// Opening beyond this count evicts the least recently used instance.
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            max_sessions: 5_000,
        }
    }
}

struct SessionEntry {
    store: FormStore,
    last_seen: Instant,
    activity: u64,
    submitting: bool,
}

type SessionTable = HashMap<SessionId, SessionEntry>;

/// Hosts independent form instances and routes view events into them.
///
/// Each event takes the session table lock for one complete store operation, so events
/// against an instance are applied strictly one after another. Submissions release the lock
/// while the sink runs and settle the store afterwards. Idle instances are evicted lazily
/// whenever the table is touched.
pub struct FormSessionService<S> {
    catalog: Arc<FormCatalog>,
    sessions: Mutex<SessionTable>,
    controller: SubmissionController<Arc<S>>,
    limits: SessionLimits,
    sequence: AtomicU64,
    activity: AtomicU64,
}

impl<S> FormSessionService<S>
where
    S: SubmissionSink + 'static,
{
    pub fn new(catalog: Arc<FormCatalog>, sink: Arc<S>) -> Self {
        Self {
            catalog,
            sessions: Mutex::new(HashMap::new()),
            controller: SubmissionController::new(sink),
            limits: SessionLimits::default(),
            sequence: AtomicU64::new(1),
            activity: AtomicU64::new(0),
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    pub fn catalog(&self) -> &FormCatalog {
        &self.catalog
    }

    pub fn sink(&self) -> &S {
        self.controller.sink()
    }

    /// Mount a fresh instance of `form` with empty values.
    pub fn open(&self, form: &str) -> Result<SessionView, FormSessionError> {
        let schema = self
            .catalog
            .get(form)
            .ok_or_else(|| FormSessionError::UnknownForm(form.to_string()))?;

        let session_id = self.next_session_id();
        let store = FormStore::new(schema);
        let snapshot = store.snapshot();

        let mut sessions = self.lock()?;
        self.evict_idle_in(&mut sessions);
        while sessions.len() >= self.limits.max_sessions {
            match evict_least_recent(&mut sessions) {
                Some(evicted) => debug!(session_id = %evicted, "form session evicted at capacity"),
                None => break,
            }
        }
        sessions.insert(
            session_id.clone(),
            SessionEntry {
                store,
                last_seen: Instant::now(),
                activity: self.next_activity(),
                submitting: false,
            },
        );
        drop(sessions);

        info!(%session_id, form, "form session opened");
        Ok(SessionView {
            session_id,
            snapshot,
        })
    }

    pub fn snapshot(&self, session_id: &SessionId) -> Result<FormSnapshot, FormSessionError> {
        self.with_entry(session_id, |entry| Ok(entry.store.snapshot()))
    }

    /// Input-change event.
    pub fn change(
        &self,
        session_id: &SessionId,
        field: &str,
        value: String,
    ) -> Result<FormSnapshot, FormSessionError> {
        self.with_entry(session_id, |entry| {
            entry.store.set_value(field, value)?;
            debug!(%session_id, field, valid = entry.store.is_valid(), "field changed");
            Ok(entry.store.snapshot())
        })
    }

    /// Blur event.
    pub fn blur(&self, session_id: &SessionId, field: &str) -> Result<FormSnapshot, FormSessionError> {
        self.with_entry(session_id, |entry| {
            entry.store.set_touched(field)?;
            Ok(entry.store.snapshot())
        })
    }

    /// Submit event. The sink call runs without holding the session table, so it may block.
    pub fn submit(&self, session_id: &SessionId) -> Result<SubmissionReceipt, FormSessionError> {
        let prepared = self.with_entry(session_id, |entry| {
            if entry.submitting {
                return Err(FormSessionError::SubmissionInProgress(session_id.clone()));
            }
            match SubmissionController::<Arc<S>>::prepare(&mut entry.store) {
                Ok(values) => {
                    entry.submitting = true;
                    Ok(Ok((entry.store.schema().id().to_string(), values)))
                }
                Err(rejected) => Ok(Err(SubmissionReceipt {
                    session_id: session_id.clone(),
                    outcome: rejected,
                    snapshot: entry.store.snapshot(),
                })),
            }
        })?;

        let (form, values) = match prepared {
            Ok(prepared) => prepared,
            Err(rejected) => {
                if let SubmissionOutcome::Rejected { errors } = &rejected.outcome {
                    debug!(%session_id, errors = errors.len(), "submission rejected");
                }
                return Ok(rejected);
            }
        };

        let outcome = self.controller.record(&form, values);
        match &outcome {
            SubmissionOutcome::Failed { reason, .. } => {
                warn!(%session_id, %reason, "submission sink failed; values retained");
            }
            _ => info!(%session_id, form = %form, "submission accepted"),
        }

        let mut sessions = self.lock()?;
        let Some(entry) = sessions.get_mut(session_id) else {
            warn!(%session_id, outcome = outcome.label(), "form session closed during submit");
            return Err(FormSessionError::SessionNotFound(session_id.clone()));
        };
        entry.submitting = false;
        entry.last_seen = Instant::now();
        entry.activity = self.next_activity();
        SubmissionController::<Arc<S>>::settle(&mut entry.store, &outcome);

        Ok(SubmissionReceipt {
            session_id: session_id.clone(),
            outcome,
            snapshot: entry.store.snapshot(),
        })
    }

    /// Discard an instance when the visitor navigates away.
    pub fn close(&self, session_id: &SessionId) -> Result<(), FormSessionError> {
        self.lock()?
            .remove(session_id)
            .map(|_| info!(%session_id, "form session closed"))
            .ok_or_else(|| FormSessionError::SessionNotFound(session_id.clone()))
    }

    /// Drop every instance idle for longer than the configured TTL; returns how many went.
    pub fn evict_idle(&self) -> Result<usize, FormSessionError> {
        let mut sessions = self.lock()?;
        Ok(self.evict_idle_in(&mut sessions))
    }

    pub fn active_sessions(&self) -> Result<usize, FormSessionError> {
        let mut sessions = self.lock()?;
        self.evict_idle_in(&mut sessions);
        Ok(sessions.len())
    }

    fn with_entry<T>(
        &self,
        session_id: &SessionId,
        apply: impl FnOnce(&mut SessionEntry) -> Result<T, FormSessionError>,
    ) -> Result<T, FormSessionError> {
        let mut sessions = self.lock()?;
        self.evict_idle_in(&mut sessions);
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| FormSessionError::SessionNotFound(session_id.clone()))?;
        entry.last_seen = Instant::now();
        entry.activity = self.next_activity();
        apply(entry)
    }

    fn evict_idle_in(&self, sessions: &mut SessionTable) -> usize {
        let now = Instant::now();
        let ttl = self.limits.idle_ttl;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.submitting || now.saturating_duration_since(entry.last_seen) <= ttl
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "idle form sessions evicted");
        }
        evicted
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionTable>, FormSessionError> {
        self.sessions
            .lock()
            .map_err(|_| FormSessionError::Unavailable)
    }

    fn next_session_id(&self) -> SessionId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        SessionId(format!("form-{id:06}"))
    }

    fn next_activity(&self) -> u64 {
        self.activity.fetch_add(1, Ordering::Relaxed)
    }
}

/// Remove the least recently used instance that is not mid-submit.
fn evict_least_recent(sessions: &mut SessionTable) -> Option<SessionId> {
    let oldest = sessions
        .iter()
        .filter(|(_, entry)| !entry.submitting)
        .min_by_key(|(_, entry)| entry.activity)
        .map(|(id, _)| id.clone())?;
    sessions.remove(&oldest);
    Some(oldest)
}

#[derive(Debug, thiserror::Error)]
pub enum FormSessionError {
    #[error("unknown form `{0}`")]
    UnknownForm(String),
    #[error("form session `{0}` not found")]
    SessionNotFound(SessionId),
    #[error(transparent)]
    Field(#[from] FormError),
    #[error("form session `{0}` already has a submission in flight")]
    SubmissionInProgress(SessionId),
    #[error("form session table unavailable")]
    Unavailable,
}
