//! In-memory edit sessions: one undo/redo history per session id.
//!
//! Sessions idle for longer than the configured TTL are evicted by a
//! background sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::errors::AppError;
use crate::models::layout::Layout;
use crate::revision::diff::{analyze_transform, TransformAnalysis};
use crate::revision::history::HistoryManager;
use crate::revision::interpreter::{interpret_command, Interpretation};
use crate::revision::transforms::Transform;

pub const DEFAULT_SESSION_TTL_SECS: usize = 3600;

/// Upper bound on the time between idle sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct EditSession {
    history: HistoryManager,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Client view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub layout: Layout,
    pub can_undo: bool,
    pub can_redo: bool,
    pub history_len: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of applying transforms to a session. `analysis` is `None` when
/// nothing was applied.
#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub session: SessionSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<Interpretation>,
    pub analysis: Option<TransformAnalysis>,
}

/// Result of an undo or redo. `layout` is `None` at a history boundary.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryStep {
    pub layout: Option<Layout>,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, EditSession>>>,
    history_cap: usize,
}

impl SessionStore {
    pub fn new(history_cap: usize) -> Self {
        SessionStore {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            history_cap,
        }
    }

    pub async fn create(&self, layout: Layout) -> SessionSnapshot {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let session = EditSession {
            history: HistoryManager::new(layout, self.history_cap),
            created_at: now,
            updated_at: now,
        };
        let snapshot = snapshot(id, &session);
        self.sessions.write().await.insert(id, session);
        info!(session_id = %id, sections = snapshot.layout.len(), "Edit session created");
        snapshot
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionSnapshot, AppError> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).ok_or_else(|| not_found(id))?;
        Ok(snapshot(id, session))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!(session_id = %id, "Edit session deleted");
                Ok(())
            }
            None => Err(not_found(id)),
        }
    }

    /// Interprets `text` against the session's current layout and applies the
    /// resulting transforms as one history entry.
    pub async fn run_command(
        &self,
        id: Uuid,
        text: &str,
        catalog: &Catalog,
    ) -> Result<EditOutcome, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;

        let interpretation = interpret_command(text, session.history.current());
        debug!(
            session_id = %id,
            intents = ?interpretation.intents,
            warnings = interpretation.warnings.len(),
            "Command interpreted"
        );
        let analysis = apply_to_session(session, &interpretation.transforms, catalog);
        Ok(EditOutcome {
            session: snapshot(id, session),
            interpretation: Some(interpretation),
            analysis,
        })
    }

    pub async fn apply_transforms(
        &self,
        id: Uuid,
        transforms: &[Transform],
        catalog: &Catalog,
    ) -> Result<EditOutcome, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        let analysis = apply_to_session(session, transforms, catalog);
        Ok(EditOutcome {
            session: snapshot(id, session),
            interpretation: None,
            analysis,
        })
    }

    pub async fn undo(&self, id: Uuid) -> Result<HistoryStep, AppError> {
        self.step(id, HistoryManager::undo).await
    }

    pub async fn redo(&self, id: Uuid) -> Result<HistoryStep, AppError> {
        self.step(id, HistoryManager::redo).await
    }

    async fn step(
        &self,
        id: Uuid,
        mv: fn(&mut HistoryManager) -> Option<&Layout>,
    ) -> Result<HistoryStep, AppError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        let layout = mv(&mut session.history).cloned();
        if layout.is_some() {
            session.updated_at = Utc::now();
        }
        Ok(HistoryStep {
            layout,
            can_undo: session.history.can_undo(),
            can_redo: session.history.can_redo(),
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions not touched within `ttl` of `now`.
    ///
    /// Returns the number of sessions evicted.
    pub async fn evict_idle(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let idle = (now - session.updated_at).to_std().unwrap_or_default();
            if idle < ttl {
                return true;
            }
            info!(session_id = %id, idle_secs = idle.as_secs(), "Idle edit session evicted");
            false
        });
        before - sessions.len()
    }

    /// Spawns the background task that evicts idle sessions.
    pub fn spawn_idle_sweeper(&self, ttl: Duration) {
        let store = self.clone();
        let every = ttl.min(SWEEP_INTERVAL);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = store.evict_idle(Utc::now(), ttl).await;
                if evicted > 0 {
                    debug!(evicted, "Idle session sweep finished");
                }
            }
        });
    }
}

fn apply_to_session(
    session: &mut EditSession,
    transforms: &[Transform],
    catalog: &Catalog,
) -> Option<TransformAnalysis> {
    if transforms.is_empty() {
        return None;
    }
    debug!(
        ops = ?transforms.iter().map(Transform::name).collect::<Vec<_>>(),
        "Applying transforms"
    );
    let before = session.history.current().clone();
    let after = session.history.apply(transforms, catalog);
    let analysis = analyze_transform(&before, after);
    session.updated_at = Utc::now();
    Some(analysis)
}

fn snapshot(id: Uuid, session: &EditSession) -> SessionSnapshot {
    SessionSnapshot {
        session_id: id,
        layout: session.history.current().clone(),
        can_undo: session.history.can_undo(),
        can_redo: session.history.can_redo(),
        history_len: session.history.len(),
        created_at: session.created_at,
        updated_at: session.updated_at,
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
