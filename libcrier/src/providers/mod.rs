//! Delivery provider abstraction and implementations
//!
//! A provider is the pluggable backend that actually delivers a post to an
//! external destination. The core never inspects provider internals; it
//! only depends on the [`Provider`] trait and selects an implementation by
//! its configured name through [`ProviderRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::DeliveryError;

pub mod stub;

// The mock provider is available for all builds (not just tests) to support
// integration tests in dependent crates.
pub mod mock;

pub use stub::StubProvider;

/// Outcome of a successful delivery
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Identifier assigned by the external destination
    pub external_id: String,
    /// Human-readable outcome detail reported by the provider
    pub message: String,
}

/// A delivery backend.
///
/// Implementations must be cheap to share across tasks; all state needed
/// for delivery belongs in the implementation itself, configured at
/// construction time.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Lowercase identifier of the backend (e.g. "stub")
    fn name(&self) -> &str;

    /// Deliver a post.
    ///
    /// `media_paths` is the ordered list of local files attached to the
    /// post; an empty list is valid.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] with a human-readable message when the
    /// destination rejects the post or cannot be reached.
    async fn publish(
        &self,
        text: &str,
        media_paths: &[String],
    ) -> std::result::Result<Delivery, DeliveryError>;
}

type Constructor = fn() -> Arc<dyn Provider>;

/// Registry mapping provider names to constructors.
///
/// Resolution happens once at startup; an unrecognized name resolves to
/// the built-in stub and the fallback decision is logged at that point
/// rather than on every publish.
pub struct ProviderRegistry {
    constructors: HashMap<String, Constructor>,
}

impl ProviderRegistry {
    /// Registry with the built-in providers
    pub fn builtin() -> Self {
        let mut registry = Self {
            constructors: HashMap::new(),
        };
        registry.register("stub", || Arc::new(StubProvider::new()));
        registry
    }

    /// Register a provider constructor under a name
    pub fn register(&mut self, name: &str, constructor: Constructor) {
        self.constructors.insert(name.to_lowercase(), constructor);
    }

    /// Resolve a configured provider name to an instance
    pub fn resolve(&self, name: &str) -> Arc<dyn Provider> {
        match self.constructors.get(&name.to_lowercase()) {
            Some(constructor) => {
                let provider = constructor();
                info!("using provider '{}'", provider.name());
                provider
            }
            None => {
                warn!(
                    "unknown provider '{}', falling back to the built-in stub",
                    name
                );
                Arc::new(StubProvider::new())
            }
        }
    }
}
