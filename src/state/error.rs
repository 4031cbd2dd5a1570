use thiserror::Error;

use crate::core::errors::ApiError;

/// Startup failures, by subsystem.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("configuration error: {0}")]
    Config(ApiError),
    #[error("knowledge base error: {0}")]
    Knowledge(ApiError),
}
