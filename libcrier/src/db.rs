//! Database operations for crier

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::path::Path;

use crate::error::{CrierError, Result};
use crate::types::{
    MediaAsset, NewMedia, Post, PostWithMedia, PublishLog, Schedule, ScheduleStatus,
};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        // Expand path and create parent directories
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(crate::error::DbError::IoError)?;
        }

        // Use forward slashes for the SQLite URL (works on both Windows and
        // Unix) and mode=rwc so a missing database file gets created.
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(crate::error::DbError::MigrationError)?;

        Ok(Self { pool })
    }

    // ------------------------------------------------------------------
    // Media assets
    // ------------------------------------------------------------------

    /// Register a media asset already stored on disk
    pub async fn create_media(&self, media: &NewMedia) -> Result<MediaAsset> {
        let created_at = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO media_assets (filename, content_type, size_bytes, storage_path, sha256, alt_text, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&media.filename)
        .bind(&media.content_type)
        .bind(media.size_bytes)
        .bind(&media.storage_path)
        .bind(&media.sha256)
        .bind(&media.alt_text)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(MediaAsset {
            id: result.last_insert_rowid(),
            filename: media.filename.clone(),
            content_type: media.content_type.clone(),
            size_bytes: media.size_bytes,
            storage_path: media.storage_path.clone(),
            sha256: media.sha256.clone(),
            alt_text: media.alt_text.clone(),
            created_at,
        })
    }

    /// Get a media asset by ID
    pub async fn get_media(&self, media_id: i64) -> Result<MediaAsset> {
        let row = sqlx::query(
            r#"
            SELECT id, filename, content_type, size_bytes, storage_path, sha256, alt_text, created_at
            FROM media_assets WHERE id = ?
            "#,
        )
        .bind(media_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        row.map(|r| media_from_row(&r)).ok_or(CrierError::NotFound {
            entity: "Media",
            id: media_id,
        })
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    /// Create a post with an ordered list of attached media ids.
    ///
    /// Every referenced media id must exist; the attachment order is
    /// preserved via the `position` column.
    pub async fn create_post(&self, text: &str, media_ids: &[i64]) -> Result<Post> {
        for &media_id in media_ids {
            self.get_media(media_id).await?;
        }

        let created_at = chrono::Utc::now().timestamp();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        let result = sqlx::query(
            r#"
            INSERT INTO posts (text, created_at)
            VALUES (?, ?)
            "#,
        )
        .bind(text)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        let post_id = result.last_insert_rowid();

        for (position, &media_id) in media_ids.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO post_media (post_id, media_id, position)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(post_id)
            .bind(media_id)
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(crate::error::DbError::SqlxError)?;
        }

        tx.commit().await.map_err(crate::error::DbError::SqlxError)?;

        Ok(Post {
            id: post_id,
            text: text.to_string(),
            created_at,
        })
    }

    /// Get a post by ID
    pub async fn get_post(&self, post_id: i64) -> Result<Post> {
        let row = sqlx::query(
            r#"
            SELECT id, text, created_at
            FROM posts WHERE id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        row.map(|r| Post {
            id: r.get("id"),
            text: r.get("text"),
            created_at: r.get("created_at"),
        })
        .ok_or(CrierError::NotFound {
            entity: "Post",
            id: post_id,
        })
    }

    /// Get the media attached to a post, in attachment order
    pub async fn get_post_media(&self, post_id: i64) -> Result<Vec<MediaAsset>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.filename, m.content_type, m.size_bytes, m.storage_path, m.sha256, m.alt_text, m.created_at
            FROM post_media pm
            JOIN media_assets m ON m.id = pm.media_id
            WHERE pm.post_id = ?
            ORDER BY pm.position
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(rows.iter().map(media_from_row).collect())
    }

    /// Get a post with its attached media
    pub async fn get_post_with_media(&self, post_id: i64) -> Result<PostWithMedia> {
        let post = self.get_post(post_id).await?;
        let media = self.get_post_media(post_id).await?;
        Ok(PostWithMedia { post, media })
    }

    // ------------------------------------------------------------------
    // Schedules
    // ------------------------------------------------------------------

    /// Create a schedule for a post.
    ///
    /// New schedules start `queued` with zero attempts.
    pub async fn create_schedule(&self, post_id: i64, scheduled_at: i64) -> Result<Schedule> {
        let created_at = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO schedules (post_id, scheduled_at, status, attempt_count, created_at)
            VALUES (?, ?, 'queued', 0, ?)
            "#,
        )
        .bind(post_id)
        .bind(scheduled_at)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(Schedule {
            id: result.last_insert_rowid(),
            post_id,
            scheduled_at,
            status: ScheduleStatus::Queued,
            attempt_count: 0,
            last_error: None,
            created_at,
        })
    }

    /// Get a schedule by ID
    pub async fn get_schedule(&self, schedule_id: i64) -> Result<Schedule> {
        let row = sqlx::query(
            r#"
            SELECT id, post_id, scheduled_at, status, attempt_count, last_error, created_at
            FROM schedules WHERE id = ?
            "#,
        )
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        row.map(|r| schedule_from_row(&r))
            .ok_or(CrierError::NotFound {
                entity: "Schedule",
                id: schedule_id,
            })
    }

    /// List schedules, most recently created first
    pub async fn list_schedules(&self, limit: i64) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, scheduled_at, status, attempt_count, last_error, created_at
            FROM schedules
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(rows.iter().map(schedule_from_row).collect())
    }

    /// Claim the batch of schedules due for publication.
    ///
    /// Returns up to `limit` queued schedules whose `scheduled_at` is at or
    /// before `now`, earliest due time first. In a single-process deployment
    /// the claim window and the subsequent status update happen in the same
    /// scheduler iteration, so a plain filtered read is sufficient; running
    /// multiple scheduler instances against one database requires turning
    /// this into an atomic claim-and-mark transaction.
    pub async fn claim_due(&self, now: i64, limit: i64) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, scheduled_at, status, attempt_count, last_error, created_at
            FROM schedules
            WHERE status = 'queued' AND scheduled_at <= ?
            ORDER BY scheduled_at, id
            LIMIT ?
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(rows.iter().map(schedule_from_row).collect())
    }

    /// Persist the outcome of a publish attempt for a schedule
    pub async fn update_schedule_status(
        &self,
        schedule_id: i64,
        status: ScheduleStatus,
        attempt_count: i64,
        last_error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE schedules SET status = ?, attempt_count = ?, last_error = ? WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(attempt_count)
        .bind(last_error)
        .bind(schedule_id)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Publish logs
    // ------------------------------------------------------------------

    /// Append a publish log row. Logs are immutable once written.
    pub async fn create_publish_log(
        &self,
        post_id: i64,
        provider: &str,
        external_id: &str,
        status: &str,
        message: &str,
    ) -> Result<PublishLog> {
        let created_at = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO publish_logs (post_id, provider, external_id, status, message, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post_id)
        .bind(provider)
        .bind(external_id)
        .bind(status)
        .bind(message)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(PublishLog {
            id: result.last_insert_rowid(),
            post_id,
            provider: provider.to_string(),
            external_id: external_id.to_string(),
            status: status.to_string(),
            message: message.to_string(),
            created_at,
        })
    }

    /// List publish logs for a post, newest first
    pub async fn list_publish_logs(&self, post_id: i64) -> Result<Vec<PublishLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, provider, external_id, status, message, created_at
            FROM publish_logs
            WHERE post_id = ?
            ORDER BY id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(rows
            .iter()
            .map(|r| PublishLog {
                id: r.get("id"),
                post_id: r.get("post_id"),
                provider: r.get("provider"),
                external_id: r.get("external_id"),
                status: r.get("status"),
                message: r.get("message"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}

fn media_from_row(r: &sqlx::sqlite::SqliteRow) -> MediaAsset {
    MediaAsset {
        id: r.get("id"),
        filename: r.get("filename"),
        content_type: r.get("content_type"),
        size_bytes: r.get("size_bytes"),
        storage_path: r.get("storage_path"),
        sha256: r.get("sha256"),
        alt_text: r.get("alt_text"),
        created_at: r.get("created_at"),
    }
}

fn schedule_from_row(r: &sqlx::sqlite::SqliteRow) -> Schedule {
    Schedule {
        id: r.get("id"),
        post_id: r.get("post_id"),
        scheduled_at: r.get("scheduled_at"),
        status: match r.get::<String, _>("status").as_str() {
            "posted" => ScheduleStatus::Posted,
            "failed" => ScheduleStatus::Failed,
            _ => ScheduleStatus::Queued,
        },
        attempt_count: r.get("attempt_count"),
        last_error: r.get("last_error"),
        created_at: r.get("created_at"),
    }
}
