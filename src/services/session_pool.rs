//! Admission-controlled session registry.
//!
//! A pool owns a fixed number of admission permits. Creating a session takes a
//! permit without waiting; completing, failing, or expiring it gives exactly
//! one back. Each admitted session sits behind its own mutex so writers to
//! different sessions never contend on more than the registry map lookup.
//! Store I/O always happens after the session mutex is released, and the
//! registry lock is never held across an await on a session.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedSemaphorePermit, RwLock, Semaphore};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::session::cutoff_before;
use crate::domain::models::{
    ExecutionState, ReasoningResult, Session, SessionStatus, StrategicState,
};
use crate::domain::ports::SessionRepository;

/// An admitted session and the permit it holds.
struct ActiveSession {
    created_at: DateTime<Utc>,
    session: Mutex<Session>,
    _permit: OwnedSemaphorePermit,
}

pub struct SessionPool<R: SessionRepository> {
    repository: Arc<R>,
    permits: Arc<Semaphore>,
    capacity: usize,
    active: RwLock<HashMap<Uuid, Arc<ActiveSession>>>,
}

impl<R: SessionRepository> SessionPool<R> {
    pub fn new(repository: Arc<R>, capacity: usize) -> Self {
        Self {
            repository,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            active: RwLock::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Admission ceiling.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sessions currently holding a permit.
    pub fn active_count(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Admit and persist a new active session.
    ///
    /// Fails fast with `AdmissionRejected` when the pool is full.
    pub async fn create_session(&self) -> DomainResult<Session> {
        let permit = self
            .permits
            .clone()
            .try_acquire_owned()
            .map_err(|_| DomainError::AdmissionRejected {
                capacity: self.capacity,
            })?;

        let session = Session::new();
        self.repository.save(&session).await?;

        let entry = Arc::new(ActiveSession {
            created_at: session.created_at,
            session: Mutex::new(session.clone()),
            _permit: permit,
        });
        self.active.write().await.insert(session.id, entry);

        tracing::info!(
            session_id = %session.id,
            active = self.active_count(),
            capacity = self.capacity,
            "Session admitted"
        );
        Ok(session)
    }

    async fn entry(&self, id: Uuid) -> Option<Arc<ActiveSession>> {
        self.active.read().await.get(&id).cloned()
    }

    async fn take(&self, id: Uuid) -> DomainResult<Arc<ActiveSession>> {
        self.active
            .write()
            .await
            .remove(&id)
            .ok_or(DomainError::SessionNotFound(id))
    }

    /// Replace the registry copy of an admitted session and persist it.
    pub async fn update_session(&self, session: &Session) -> DomainResult<()> {
        let entry = self
            .entry(session.id)
            .await
            .ok_or(DomainError::SessionNotFound(session.id))?;

        let snapshot = {
            let mut guard = entry.session.lock().await;
            *guard = session.clone();
            guard.updated_at = Utc::now();
            guard.clone()
        };
        drop(entry);
        self.repository.save(&snapshot).await
    }

    /// Store the final state and result, persist, and release the slot.
    ///
    /// A session that timed out while its run was still going keeps its
    /// `Timeout` status but still receives the result.
    pub async fn complete_session(
        &self,
        id: Uuid,
        result: ReasoningResult,
        strategic_state: StrategicState,
        execution_state: Option<ExecutionState>,
    ) -> DomainResult<Session> {
        let removed = self.active.write().await.remove(&id);
        let Some(entry) = removed else {
            return self
                .record_late_result(id, result, strategic_state, execution_state)
                .await;
        };
        let mut session = entry.session.lock().await.clone();
        drop(entry);

        session.complete(result, strategic_state, execution_state);
        tracing::info!(session_id = %id, "Session completed");
        self.repository.save(&session).await?;
        Ok(session)
    }

    async fn record_late_result(
        &self,
        id: Uuid,
        result: ReasoningResult,
        strategic_state: StrategicState,
        execution_state: Option<ExecutionState>,
    ) -> DomainResult<Session> {
        let mut session = match self.repository.load(id).await? {
            Some(session) if session.status == SessionStatus::Timeout => session,
            _ => return Err(DomainError::SessionNotFound(id)),
        };

        session.attach_late_result(result, strategic_state, execution_state);
        tracing::warn!(session_id = %id, "Result stored on timed-out session");
        self.repository.save(&session).await?;
        Ok(session)
    }

    /// Mark an admitted session failed, persist, and release the slot.
    pub async fn fail_session(&self, id: Uuid, message: &str) -> DomainResult<()> {
        let entry = self.take(id).await?;
        let mut session = entry.session.lock().await.clone();
        drop(entry);

        session.fail(message);
        tracing::warn!(session_id = %id, error = message, "Session failed");
        self.repository.save(&session).await
    }

    /// Registry first, then the store.
    pub async fn get_session(&self, id: Uuid) -> DomainResult<Option<Session>> {
        if let Some(entry) = self.entry(id).await {
            return Ok(Some(entry.session.lock().await.clone()));
        }
        self.repository.load(id).await
    }

    pub async fn list_sessions(
        &self,
        status: Option<SessionStatus>,
        limit: usize,
    ) -> DomainResult<Vec<Session>> {
        self.repository.list(status, limit).await
    }

    /// Mark stored sessions that are active but unknown to this pool as timed out.
    ///
    /// Such sessions were orphaned by a previous process. Returns how many
    /// were marked.
    pub async fn recover(&self) -> DomainResult<usize> {
        let stored = self.repository.list_active().await?;
        let mut recovered = 0;

        for id in stored {
            if self.active.read().await.contains_key(&id) {
                continue;
            }
            if let Some(mut session) = self.repository.load(id).await? {
                session.update_status(SessionStatus::Timeout);
                self.repository.save(&session).await?;
                recovered += 1;
            }
        }

        if recovered > 0 {
            tracing::warn!(count = recovered, "Orphaned sessions marked as timed out");
        }
        Ok(recovered)
    }

    /// Time out admitted sessions created more than `timeout` ago and release
    /// their slots.
    pub async fn expire_stale(&self, timeout: Duration) -> DomainResult<usize> {
        let Some(cutoff) = cutoff_before(timeout) else {
            return Ok(0);
        };
        let stale: Vec<Arc<ActiveSession>> = {
            let mut active = self.active.write().await;
            let ids: Vec<Uuid> = active
                .iter()
                .filter(|(_, entry)| entry.created_at < cutoff)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| active.remove(id)).collect()
        };

        let count = stale.len();
        for entry in stale {
            let mut session = entry.session.lock().await.clone();
            drop(entry);
            session.update_status(SessionStatus::Timeout);
            tracing::warn!(session_id = %session.id, "Session timed out");
            self.repository.save(&session).await?;
        }
        Ok(count)
    }

    /// Delete finished sessions older than `retention`.
    pub async fn purge_expired(&self, retention: Duration) -> DomainResult<u64> {
        let purged = self.repository.purge_older_than(retention).await?;
        tracing::info!(purged, retention_days = retention.num_days(), "Expired sessions purged");
        Ok(purged)
    }
}
