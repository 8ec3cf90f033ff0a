use sqlx::PgPool;
use uuid::Uuid;

use super::model::{JobStatus, VideoJob};

const JOB_COLUMNS: &str = "id, filename, status, runtime, created_at, updated_at";

pub struct VideoRepository;

impl VideoRepository {
    pub async fn insert(pool: &PgPool, id: Uuid, filename: &str) -> Result<VideoJob, sqlx::Error> {
        sqlx::query_as::<_, VideoJob>(&format!(
            "INSERT INTO video_jobs (id, filename, status) VALUES ($1, $2, $3) RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(filename)
        .bind(JobStatus::InProcess.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn list(
        pool: &PgPool,
        status: Option<JobStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VideoJob>, sqlx::Error> {
        sqlx::query_as::<_, VideoJob>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM video_jobs
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<VideoJob>, sqlx::Error> {
        sqlx::query_as::<_, VideoJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM video_jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Record how a job ended. Returns `false` when no such job exists.
    pub async fn set_outcome(
        pool: &PgPool,
        id: Uuid,
        status: JobStatus,
        runtime: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE video_jobs SET status = $1, runtime = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(status.as_str())
        .bind(runtime)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
