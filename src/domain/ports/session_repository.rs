//! Session repository port.
//!
//! Durable key-value persistence of reasoning sessions. Services depend on
//! this trait, not on concrete storage.

use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Session, SessionStatus};

/// Repository trait for session persistence
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or replace a session, keyed by its id.
    async fn save(&self, session: &Session) -> DomainResult<()>;

    /// Load a session by id.
    async fn load(&self, id: Uuid) -> DomainResult<Option<Session>>;

    /// Ids of all sessions whose status is active.
    async fn list_active(&self) -> DomainResult<Vec<Uuid>>;

    /// List sessions, newest first, optionally filtered by status.
    async fn list(&self, status: Option<SessionStatus>, limit: usize) -> DomainResult<Vec<Session>>;

    /// Delete finished sessions last updated more than `age` ago.
    ///
    /// Active sessions are never purged. Returns the number deleted.
    async fn purge_older_than(&self, age: Duration) -> DomainResult<u64>;
}
