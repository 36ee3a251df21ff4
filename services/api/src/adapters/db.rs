//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `PathRepository` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learning_path_core::{
    LearningPath, MilestoneProgress, PathRepository, PortError, PortResult, SavedPath,
};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `PathRepository` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn path_not_found(path_id: Uuid) -> PortError {
    PortError::NotFound(format!("Learning path {} not found", path_id))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PathRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    topic: String,
    path_data: Json<LearningPath>,
    is_archived: bool,
    created_at: DateTime<Utc>,
}
impl PathRecord {
    fn to_domain(self) -> SavedPath {
        SavedPath {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            topic: self.topic,
            path: self.path_data.0,
            is_archived: self.is_archived,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ProgressRecord {
    path_id: Uuid,
    milestone: String,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
}
impl ProgressRecord {
    fn to_domain(self) -> MilestoneProgress {
        MilestoneProgress {
            path_id: self.path_id,
            milestone: self.milestone,
            completed: self.completed,
            completed_at: self.completed_at,
        }
    }
}

const PATH_COLUMNS: &str = "id, user_id, title, topic, path_data, is_archived, created_at";

//=========================================================================================
// `PathRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl PathRepository for DbAdapter {
    async fn save_path(&self, user_id: Uuid, path: &LearningPath) -> PortResult<SavedPath> {
        let record = sqlx::query_as::<_, PathRecord>(&format!(
            "INSERT INTO learning_paths (id, user_id, title, topic, path_data) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PATH_COLUMNS
        ))
        .bind(path.id)
        .bind(user_id)
        .bind(&path.title)
        .bind(&path.topic)
        .bind(Json(path))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_path(&self, user_id: Uuid, path_id: Uuid) -> PortResult<SavedPath> {
        let record = sqlx::query_as::<_, PathRecord>(&format!(
            "SELECT {} FROM learning_paths WHERE id = $1 AND user_id = $2",
            PATH_COLUMNS
        ))
        .bind(path_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => path_not_found(path_id),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_paths(&self, user_id: Uuid, archived: bool) -> PortResult<Vec<SavedPath>> {
        let records = sqlx::query_as::<_, PathRecord>(&format!(
            "SELECT {} FROM learning_paths WHERE user_id = $1 AND is_archived = $2 \
             ORDER BY created_at DESC",
            PATH_COLUMNS
        ))
        .bind(user_id)
        .bind(archived)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(PathRecord::to_domain).collect())
    }

    async fn set_archived(&self, user_id: Uuid, path_id: Uuid, archived: bool) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE learning_paths SET is_archived = $3 WHERE id = $1 AND user_id = $2",
        )
        .bind(path_id)
        .bind(user_id)
        .bind(archived)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(path_not_found(path_id));
        }
        Ok(())
    }

    async fn delete_path(&self, user_id: Uuid, path_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM learning_paths WHERE id = $1 AND user_id = $2")
            .bind(path_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(path_not_found(path_id));
        }
        Ok(())
    }

    async fn record_progress(
        &self,
        path_id: Uuid,
        milestone: &str,
        completed: bool,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO learning_progress (path_id, milestone, completed, completed_at) \
             VALUES ($1, $2, $3, CASE WHEN $3 THEN NOW() ELSE NULL END) \
             ON CONFLICT (path_id, milestone) DO UPDATE \
             SET completed = EXCLUDED.completed, completed_at = EXCLUDED.completed_at",
        )
        .bind(path_id)
        .bind(milestone)
        .bind(completed)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_progress(&self, path_id: Uuid) -> PortResult<Vec<MilestoneProgress>> {
        let records = sqlx::query_as::<_, ProgressRecord>(
            "SELECT path_id, milestone, completed, completed_at FROM learning_progress \
             WHERE path_id = $1 ORDER BY milestone",
        )
        .bind(path_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ProgressRecord::to_domain).collect())
    }
}
