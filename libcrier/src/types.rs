//! Core types for crier

use serde::{Deserialize, Serialize};

/// A composed post: text plus an ordered set of media attachments.
///
/// Posts are immutable once created; publication state lives on
/// [`Schedule`] and [`PublishLog`], never on the post itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: i64,
}

/// A media file registered for attachment to posts.
///
/// The file itself lives in the configured media directory; the database
/// row only carries the reference plus a SHA-256 content hash for
/// integrity checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: i64,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub sha256: String,
    pub alt_text: Option<String>,
    pub created_at: i64,
}

/// Field set for inserting a new media asset (id assigned by the store).
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub sha256: String,
    pub alt_text: Option<String>,
}

/// A post together with its ordered media attachments
#[derive(Debug, Clone)]
pub struct PostWithMedia {
    pub post: Post,
    pub media: Vec<MediaAsset>,
}

/// A durable request to publish a post no earlier than `scheduled_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub post_id: i64,
    pub scheduled_at: i64,
    pub status: ScheduleStatus,
    /// Number of publish attempts ever made for this schedule, successful
    /// or not.
    pub attempt_count: i64,
    /// Message of the most recent failure; `None` whenever the last
    /// attempt succeeded.
    pub last_error: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Queued,
    Posted,
    Failed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Queued => "queued",
            ScheduleStatus::Posted => "posted",
            ScheduleStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only audit record of one confirmed delivery.
///
/// Failed attempts never produce a log row; failure bookkeeping lives on
/// the schedule (`status`, `last_error`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishLog {
    pub id: i64,
    pub post_id: i64,
    pub provider: String,
    pub external_id: String,
    pub status: String,
    pub message: String,
    pub created_at: i64,
}

impl PublishLog {
    pub const STATUS_POSTED: &'static str = "posted";
}
