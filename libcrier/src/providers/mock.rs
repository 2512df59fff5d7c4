//! Mock provider for testing
//!
//! A configurable backend that can simulate successes and failures while
//! recording every invocation, so tests can verify publish orchestration
//! without any network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::providers::{Delivery, Provider};

/// One recorded publish invocation
#[derive(Debug, Clone)]
pub struct RecordedPublish {
    pub text: String,
    pub media_paths: Vec<String>,
}

pub struct MockProvider {
    name: String,
    /// Error message to fail with; `None` means every publish succeeds
    fail_with: Option<String>,
    call_count: Arc<AtomicUsize>,
    published: Arc<Mutex<Vec<RecordedPublish>>>,
}

impl MockProvider {
    /// Mock that accepts every post
    pub fn success(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail_with: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock that rejects every post with the given message
    pub fn failure(name: &str, error: &str) -> Self {
        Self {
            fail_with: Some(error.to_string()),
            ..Self::success(name)
        }
    }

    /// Number of publish calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Snapshot of everything successfully published
    pub fn published(&self) -> Vec<RecordedPublish> {
        self.published.lock().unwrap().clone()
    }

    /// Handle for asserting on calls after the provider has been moved
    /// into a publisher
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.call_count.clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(
        &self,
        text: &str,
        media_paths: &[String],
    ) -> std::result::Result<Delivery, DeliveryError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(ref message) = self.fail_with {
            return Err(DeliveryError::new(message.clone()));
        }

        self.published.lock().unwrap().push(RecordedPublish {
            text: text.to_string(),
            media_paths: media_paths.to_vec(),
        });

        Ok(Delivery {
            external_id: format!("{}-{}", self.name, call),
            message: "delivered".to_string(),
        })
    }
}
