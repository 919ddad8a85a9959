// Errors returned by the in-memory store and aggregator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Empty server name on record, or a window that cannot be bucketed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No sample was ever recorded for this server.
    #[error("No server information found for '{entity}'.")]
    NotFound { entity: String },
}
