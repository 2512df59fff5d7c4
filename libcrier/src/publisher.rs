//! Publish orchestration
//!
//! One publish attempt for one post: load the post and its media, hand
//! them to the selected provider, and append the audit record. The same
//! path serves both the scheduler loop and the manual "publish now" CLI.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::providers::{Provider, ProviderRegistry};
use crate::types::PublishLog;

#[derive(Clone)]
pub struct Publisher {
    db: Database,
    provider: Arc<dyn Provider>,
}

impl Publisher {
    pub fn new(db: Database, provider: Arc<dyn Provider>) -> Self {
        Self { db, provider }
    }

    /// Build a publisher with the provider named in the configuration.
    ///
    /// Unrecognized names resolve to the built-in stub (logged once by the
    /// registry).
    pub fn from_config(config: &Config, db: Database) -> Self {
        let registry = ProviderRegistry::builtin();
        let provider = registry.resolve(&config.publisher.provider);
        Self::new(db, provider)
    }

    /// Name of the provider this publisher delivers through
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Publish a post and record the outcome.
    ///
    /// On success exactly one publish log row is written and returned. On
    /// failure nothing is written here: the error propagates to the
    /// caller, and failure bookkeeping (if any) is the caller's job — the
    /// scheduler records it on the schedule, the manual path surfaces it
    /// to the user. The audit trail only ever holds confirmed deliveries.
    ///
    /// # Errors
    ///
    /// `NotFound` if the post does not exist; `DeliveryError` if the
    /// provider fails.
    pub async fn publish_post(&self, post_id: i64) -> Result<PublishLog> {
        let post = self.db.get_post(post_id).await?;
        let media = self.db.get_post_media(post_id).await?;
        let media_paths: Vec<String> = media.into_iter().map(|m| m.storage_path).collect();

        let delivery = self.provider.publish(&post.text, &media_paths).await?;

        let log = self
            .db
            .create_publish_log(
                post_id,
                self.provider.name(),
                &delivery.external_id,
                PublishLog::STATUS_POSTED,
                &delivery.message,
            )
            .await?;

        info!(
            "published post {} via {} (external id: {})",
            post_id,
            self.provider.name(),
            delivery.external_id
        );

        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrierError;
    use crate::providers::mock::MockProvider;
    use tempfile::TempDir;

    async fn test_db() -> (TempDir, Database) {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        (temp, db)
    }

    #[tokio::test]
    async fn test_publish_success_writes_exactly_one_log() {
        let (_temp, db) = test_db().await;
        let post = db.create_post("hello", &[]).await.unwrap();

        let publisher = Publisher::new(db.clone(), Arc::new(MockProvider::success("mock")));
        let log = publisher.publish_post(post.id).await.unwrap();

        assert_eq!(log.post_id, post.id);
        assert_eq!(log.provider, "mock");
        assert_eq!(log.status, "posted");
        assert!(!log.external_id.is_empty());

        let logs = db.list_publish_logs(post.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, log.id);
    }

    #[tokio::test]
    async fn test_publish_failure_writes_no_log() {
        let (_temp, db) = test_db().await;
        let post = db.create_post("hello", &[]).await.unwrap();

        let publisher = Publisher::new(db.clone(), Arc::new(MockProvider::failure("mock", "rejected")));
        let err = publisher.publish_post(post.id).await.unwrap_err();

        assert_eq!(err.to_string(), "rejected");
        let logs = db.list_publish_logs(post.id).await.unwrap();
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn test_publish_missing_post_is_not_found() {
        let (_temp, db) = test_db().await;

        let provider = Arc::new(MockProvider::success("mock"));
        let counter = provider.counter();
        let publisher = Publisher::new(db.clone(), provider);

        let err = publisher.publish_post(777).await.unwrap_err();
        assert!(matches!(
            err,
            CrierError::NotFound {
                entity: "Post",
                id: 777
            }
        ));

        // The provider is never reached and no log is written
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
        let logs = db.list_publish_logs(777).await.unwrap();
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn test_publish_hands_media_paths_in_order() {
        let (_temp, db) = test_db().await;

        let mut media_ids = Vec::new();
        for name in ["a.png", "b.png"] {
            let media = crate::types::NewMedia {
                filename: name.to_string(),
                content_type: "image/png".to_string(),
                size_bytes: 1,
                storage_path: format!("/tmp/media/{}", name),
                sha256: "00".to_string(),
                alt_text: None,
            };
            media_ids.push(db.create_media(&media).await.unwrap().id);
        }
        let post = db.create_post("with media", &media_ids).await.unwrap();

        let provider = Arc::new(MockProvider::success("mock"));
        let publisher = Publisher::new(db.clone(), provider.clone());
        publisher.publish_post(post.id).await.unwrap();

        let published = provider.published();
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].media_paths,
            vec!["/tmp/media/a.png".to_string(), "/tmp/media/b.png".to_string()]
        );
    }

    #[tokio::test]
    async fn test_from_config_unknown_provider_uses_stub() {
        let (_temp, db) = test_db().await;

        let mut config = Config::default_config();
        config.publisher.provider = "does-not-exist".to_string();

        let publisher = Publisher::from_config(&config, db);
        assert_eq!(publisher.provider_name(), "stub");
    }
}
