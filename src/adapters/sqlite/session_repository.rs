//! SQLite implementation of the SessionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::session::cutoff_before;
use crate::domain::models::{Session, SessionStatus};
use crate::domain::ports::SessionRepository;

use super::{parse_datetime, parse_json_opt, parse_uuid};

const SESSION_COLUMNS: &str =
    "id, status, created_at, updated_at, strategic_state, execution_state, final_solution, error";

/// Fixed-width RFC 3339 so stored timestamps order lexicographically.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn save(&self, session: &Session) -> DomainResult<()> {
        let strategic_json = session
            .strategic_state
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let execution_json = session
            .execution_state
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let solution_json = session
            .final_solution
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"INSERT INTO sessions (id, status, created_at, updated_at, strategic_state, execution_state, final_solution, error)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   status = excluded.status,
                   updated_at = excluded.updated_at,
                   strategic_state = excluded.strategic_state,
                   execution_state = excluded.execution_state,
                   final_solution = excluded.final_solution,
                   error = excluded.error"#,
        )
        .bind(session.id.to_string())
        .bind(session.status.as_str())
        .bind(format_timestamp(session.created_at))
        .bind(format_timestamp(session.updated_at))
        .bind(strategic_json)
        .bind(execution_json)
        .bind(solution_json)
        .bind(&session.error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load(&self, id: Uuid) -> DomainResult<Option<Session>> {
        let row: Option<SessionRow> =
            sqlx::query_as(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list_active(&self) -> DomainResult<Vec<Uuid>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM sessions WHERE status = ? ORDER BY created_at")
                .bind(SessionStatus::Active.as_str())
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(|(id,)| parse_uuid(id)).collect()
    }

    async fn list(&self, status: Option<SessionStatus>, limit: usize) -> DomainResult<Vec<Session>> {
        let mut query = format!("SELECT {SESSION_COLUMNS} FROM sessions");
        if status.is_some() {
            query.push_str(" WHERE status = ?");
        }
        query.push_str(" ORDER BY created_at DESC LIMIT ?");

        let mut q = sqlx::query_as::<_, SessionRow>(&query);
        if let Some(status) = status {
            q = q.bind(status.as_str());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<SessionRow> = q.bind(limit).fetch_all(&self.pool).await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn purge_older_than(&self, age: Duration) -> DomainResult<u64> {
        let Some(cutoff) = cutoff_before(age) else {
            return Ok(0);
        };
        let cutoff = format_timestamp(cutoff);
        let result = sqlx::query("DELETE FROM sessions WHERE updated_at < ? AND status != ?")
            .bind(cutoff)
            .bind(SessionStatus::Active.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    status: String,
    created_at: String,
    updated_at: String,
    strategic_state: Option<String>,
    execution_state: Option<String>,
    final_solution: Option<String>,
    error: Option<String>,
}

impl TryFrom<SessionRow> for Session {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let status = SessionStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid status: {}", row.status))
        })?;

        Ok(Session {
            id: parse_uuid(&row.id)?,
            status,
            strategic_state: parse_json_opt(row.strategic_state)?,
            execution_state: parse_json_opt(row.execution_state)?,
            final_solution: parse_json_opt(row.final_solution)?,
            error: row.error,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::{Goal, StrategicState};

    async fn setup() -> SqliteSessionRepository {
        SqliteSessionRepository::new(create_migrated_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let repo = setup().await;
        let mut session = Session::new();
        repo.save(&session).await.unwrap();

        session.strategic_state = Some(StrategicState {
            pending_goals: vec![Goal::new("Analyze problem: x")],
            ..Default::default()
        });
        session.fail("boom");
        repo.save(&session).await.unwrap();

        let loaded = repo.load(session.id).await.unwrap().unwrap();
        assert_eq!(loaded, session);
        assert_eq!(repo.list(None, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let repo = setup().await;
        assert!(repo.load(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let repo = setup().await;
        let active = Session::new();
        let mut done = Session::new();
        done.update_status(SessionStatus::Timeout);
        repo.save(&active).await.unwrap();
        repo.save(&done).await.unwrap();

        assert_eq!(repo.list_active().await.unwrap(), vec![active.id]);
        let timed_out = repo.list(Some(SessionStatus::Timeout), 10).await.unwrap();
        assert_eq!(timed_out.len(), 1);
        assert_eq!(timed_out[0].id, done.id);
        assert_eq!(repo.list(None, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purge_keeps_active_and_recent() {
        let repo = setup().await;

        let mut old_done = Session::new();
        old_done.update_status(SessionStatus::Error);
        old_done.updated_at = Utc::now() - Duration::days(10);
        let mut old_active = Session::new();
        old_active.updated_at = Utc::now() - Duration::days(10);
        let mut recent_done = Session::new();
        recent_done.update_status(SessionStatus::Timeout);

        for s in [&old_done, &old_active, &recent_done] {
            repo.save(s).await.unwrap();
        }

        assert_eq!(repo.purge_older_than(Duration::days(7)).await.unwrap(), 1);
        assert!(repo.load(old_done.id).await.unwrap().is_none());
        assert!(repo.load(old_active.id).await.unwrap().is_some());
        assert!(repo.load(recent_done.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_with_unrepresentable_age_is_a_no_op() {
        let repo = setup().await;
        let mut old_done = Session::new();
        old_done.update_status(SessionStatus::Completed);
        old_done.updated_at = Utc::now() - Duration::days(3650);
        repo.save(&old_done).await.unwrap();

        let purged = repo
            .purge_older_than(Duration::days(i64::from(u32::MAX)))
            .await
            .unwrap();
        assert_eq!(purged, 0);
        assert!(repo.load(old_done.id).await.unwrap().is_some());
    }
}
