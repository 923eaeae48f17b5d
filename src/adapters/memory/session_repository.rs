//! Session repository backed by a map, for tests and ephemeral runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::session::cutoff_before;
use crate::domain::models::{Session, SessionStatus};
use crate::domain::ports::SessionRepository;

/// Mirrors the SQLite store's semantics without persistence.
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &Session) -> DomainResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> DomainResult<Option<Session>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn list_active(&self) -> DomainResult<Vec<Uuid>> {
        let sessions = self.sessions.read().await;
        let mut active: Vec<&Session> = sessions.values().filter(|s| s.is_active()).collect();
        active.sort_by_key(|s| s.created_at);
        Ok(active.into_iter().map(|s| s.id).collect())
    }

    async fn list(&self, status: Option<SessionStatus>, limit: usize) -> DomainResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut matching: Vec<Session> = sessions
            .values()
            .filter(|s| status.is_none_or(|st| s.status == st))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn purge_older_than(&self, age: Duration) -> DomainResult<u64> {
        let Some(cutoff) = cutoff_before(age) else {
            return Ok(0);
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.is_active() || s.updated_at >= cutoff);
        Ok((before - sessions.len()) as u64)
    }
}
