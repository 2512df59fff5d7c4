//! Media ingestion
//!
//! Media files are copied into the configured media directory under a
//! generated name and registered in the database. Posts reference assets
//! by id; providers receive the storage paths at publish time.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::db::Database;
use crate::error::{MediaError, Result};
use crate::types::{MediaAsset, NewMedia};

/// Copy a local file into the media directory and register it.
///
/// The stored name is a fresh UUID with the source extension preserved,
/// so unrelated uploads can never collide. A SHA-256 hash of the content
/// is recorded for integrity checks.
pub async fn ingest_media(
    media_config: &MediaConfig,
    db: &Database,
    source: &Path,
    alt_text: Option<String>,
) -> Result<MediaAsset> {
    if !source.is_file() {
        return Err(MediaError::Missing(source.display().to_string()).into());
    }

    let bytes = std::fs::read(source).map_err(MediaError::Io)?;
    let sha256 = hex_digest(&bytes);

    let media_dir = shellexpand::tilde(&media_config.dir).to_string();
    std::fs::create_dir_all(&media_dir).map_err(MediaError::Io)?;

    let extension = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    let stored_name = format!("{}{}", Uuid::new_v4().simple(), extension);
    let target = Path::new(&media_dir).join(&stored_name);

    std::fs::write(&target, &bytes).map_err(MediaError::Io)?;
    debug!("stored media file at {}", target.display());

    let filename = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let media = NewMedia {
        filename,
        content_type: guess_content_type(&extension).to_string(),
        size_bytes: bytes.len() as i64,
        storage_path: target.display().to_string(),
        sha256,
        alt_text,
    };

    db.create_media(&media).await
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Guess a MIME type from a lowercase file extension (leading dot included)
fn guess_content_type(extension: &str) -> &'static str {
    match extension {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".mp4" => "video/mp4",
        ".mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrierError;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, MediaConfig, Database) {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        let media_config = MediaConfig {
            dir: temp.path().join("media").display().to_string(),
        };
        (temp, media_config, db)
    }

    #[tokio::test]
    async fn test_ingest_copies_file_and_registers_asset() {
        let (temp, media_config, db) = setup().await;

        let source = temp.path().join("photo.PNG");
        std::fs::write(&source, b"fake image bytes").unwrap();

        let asset = ingest_media(&media_config, &db, &source, Some("alt".to_string()))
            .await
            .unwrap();

        assert_eq!(asset.filename, "photo.PNG");
        assert_eq!(asset.content_type, "image/png");
        assert_eq!(asset.size_bytes, 16);
        assert_eq!(asset.alt_text, Some("alt".to_string()));
        assert!(asset.storage_path.ends_with(".png"));

        // The copy holds the same bytes as the source
        let stored = std::fs::read(&asset.storage_path).unwrap();
        assert_eq!(stored, b"fake image bytes");

        // And the registration is retrievable
        let fetched = db.get_media(asset.id).await.unwrap();
        assert_eq!(fetched.sha256, asset.sha256);
    }

    #[tokio::test]
    async fn test_ingest_missing_file_fails() {
        let (temp, media_config, db) = setup().await;

        let source = temp.path().join("nope.jpg");
        let result = ingest_media(&media_config, &db, &source, None).await;

        assert!(matches!(
            result,
            Err(CrierError::Media(MediaError::Missing(_)))
        ));
    }

    #[tokio::test]
    async fn test_ingest_same_file_twice_gets_distinct_paths() {
        let (temp, media_config, db) = setup().await;

        let source = temp.path().join("photo.jpg");
        std::fs::write(&source, b"bytes").unwrap();

        let first = ingest_media(&media_config, &db, &source, None).await.unwrap();
        let second = ingest_media(&media_config, &db, &source, None).await.unwrap();

        assert_ne!(first.storage_path, second.storage_path);
        assert_eq!(first.sha256, second.sha256);
    }

    #[test]
    fn test_hex_digest_known_value() {
        // sha256 of the empty string
        assert_eq!(
            hex_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(".jpeg"), "image/jpeg");
        assert_eq!(guess_content_type(".webp"), "image/webp");
        assert_eq!(guess_content_type(".mp4"), "video/mp4");
        assert_eq!(guess_content_type(""), "application/octet-stream");
        assert_eq!(guess_content_type(".pdf"), "application/octet-stream");
    }
}
