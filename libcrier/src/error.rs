//! Error types for crier

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrierError>;

#[derive(Error, Debug)]
pub enum CrierError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("{0}")]
    Delivery(#[from] DeliveryError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CrierError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CrierError::InvalidInput(_) => 3,
            CrierError::NotFound { .. } => 2,
            CrierError::Delivery(_) => 1,
            CrierError::Config(_) => 1,
            CrierError::Database(_) => 1,
            CrierError::Media(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to store media file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media file does not exist: {0}")]
    Missing(String),
}

/// A provider failed to deliver a post.
///
/// Displays as the bare provider message so callers that record it (the
/// scheduler writes it into `last_error`) keep exactly what the provider
/// reported.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct DeliveryError {
    pub message: String,
}

impl DeliveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
