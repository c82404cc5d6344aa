/**
 * PostgreSQL Store Backend
 *
 * This module implements `StoreBackend` on top of a sqlx `PgPool`. The schema
 * lives in `migrations/` and is applied at startup by
 * `backend::server::config::load_database`.
 *
 * # Tables
 *
 * - `projects` - one row per canvas, grid stored as JSON text
 * - `users_projects` - permission grants
 * - `ratings` - one row per (project, rater)
 * - `flags` - one row per (project, flagger)
 *
 * Dependent rows are removed by `ON DELETE CASCADE` when a project is deleted.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{NewProjectRow, ProjectRow, StoreBackend, StoreError};
use crate::shared::{FlagOutcome, ProjectId};

const PROJECT_COLUMNS: &str = r#"
    project_id, owner_id, project_owner, project_name, xsize, ysize, grid,
    is_finished, started_at, finished_at, is_public, timer
"#;

/// Store backend backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StoreBackend for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn fetch_projects(&self, finished: bool) -> Result<Vec<ProjectRow>, StoreError> {
        let query = format!(
            "SELECT {} FROM projects WHERE is_finished = $1 ORDER BY project_id ASC",
            PROJECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&query)
            .bind(finished)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_project(&self, id: ProjectId) -> Result<Option<ProjectRow>, StoreError> {
        let query = format!("SELECT {} FROM projects WHERE project_id = $1", PROJECT_COLUMNS);
        let row = sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_project(&self, row: NewProjectRow) -> Result<ProjectId, StoreError> {
        #[derive(sqlx::FromRow)]
        struct IdRow {
            project_id: ProjectId,
        }

        let inserted = sqlx::query_as::<_, IdRow>(
            r#"
            INSERT INTO projects
                (owner_id, project_owner, project_name, xsize, ysize, grid,
                 is_finished, started_at, finished_at, is_public, timer)
            VALUES ($1, $2, $3, $4, $5, '', FALSE, $6, $7, FALSE, $8)
            RETURNING project_id
            "#,
        )
        .bind(row.owner_id)
        .bind(&row.project_owner)
        .bind(&row.project_name)
        .bind(row.xsize)
        .bind(row.ysize)
        .bind(row.started_at)
        .bind(row.finished_at)
        .bind(&row.timer)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted.project_id)
    }

    async fn update_grid(&self, id: ProjectId, grid: &str, xsize: i64, ysize: i64) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE projects SET grid = $2, xsize = $3, ysize = $4
            WHERE project_id = $1
            "#,
        )
        .bind(id)
        .bind(grid)
        .bind(xsize)
        .bind(ysize)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn mark_finished(&self, id: ProjectId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE projects SET is_finished = TRUE, finished_at = $2
            WHERE project_id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn delete_project(&self, id: ProjectId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM projects WHERE project_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_public(&self, id: ProjectId, value: bool) -> Result<bool, StoreError> {
        #[derive(sqlx::FromRow)]
        struct PublicRow {
            is_public: bool,
        }

        let row = sqlx::query_as::<_, PublicRow>(
            r#"
            UPDATE projects SET is_public = $2
            WHERE project_id = $1
            RETURNING is_public
            "#,
        )
        .bind(id)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.is_public).ok_or(StoreError::NotFound(id))
    }

    async fn insert_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users_projects (user_id, project_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, project_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users_projects WHERE user_id = $1 AND project_id = $2")
            .bind(user_id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn has_permission(&self, user_id: Uuid, project_id: ProjectId) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users_projects WHERE user_id = $1 AND project_id = $2)",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn permitted_project_ids(&self, user_id: Uuid) -> Result<Vec<ProjectId>, StoreError> {
        let ids: Vec<ProjectId> = sqlx::query_scalar(
            "SELECT project_id FROM users_projects WHERE user_id = $1 ORDER BY project_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn projects_without_permissions(&self) -> Result<Vec<ProjectId>, StoreError> {
        let ids: Vec<ProjectId> = sqlx::query_scalar(
            r#"
            SELECT p.project_id FROM projects p
            LEFT JOIN users_projects up ON up.project_id = p.project_id
            WHERE up.project_id IS NULL
            ORDER BY p.project_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn upsert_rating(&self, project_id: ProjectId, rater_id: Uuid, score: i32) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ratings (project_id, rater_id, score, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (project_id, rater_id) DO UPDATE SET
                score = EXCLUDED.score,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(project_id)
        .bind(rater_id)
        .bind(score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_rating(&self, project_id: ProjectId, rater_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM ratings WHERE project_id = $1 AND rater_id = $2")
            .bind(project_id)
            .bind(rater_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn average_rating(&self, project_id: ProjectId) -> Result<Option<f64>, StoreError> {
        let average: Option<f64> =
            sqlx::query_scalar("SELECT AVG(score)::FLOAT8 FROM ratings WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(average)
    }

    async fn insert_flag(&self, project_id: ProjectId, flagger_id: Uuid) -> Result<FlagOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO flags (project_id, flagger_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (project_id, flagger_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(flagger_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(FlagOutcome::AlreadyExists)
        } else {
            Ok(FlagOutcome::Created)
        }
    }

    async fn flag_count(&self, project_id: ProjectId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flags WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
