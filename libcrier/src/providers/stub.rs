//! Stub provider: accepts every post without talking to anything

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::DeliveryError;
use crate::providers::{Delivery, Provider};

/// Default no-op backend.
///
/// Never fails; each publish gets a freshly generated external id. Useful
/// for development and as the fallback when the configured provider name
/// is unrecognized.
#[derive(Debug, Default)]
pub struct StubProvider;

impl StubProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn publish(
        &self,
        text: &str,
        media_paths: &[String],
    ) -> std::result::Result<Delivery, DeliveryError> {
        debug!(
            "stub delivery: {} chars, {} media file(s)",
            text.len(),
            media_paths.len()
        );
        Ok(Delivery {
            external_id: Uuid::new_v4().to_string(),
            message: "ok".to_string(),
        })
    }
}
