//! Error types for paging navigation, data access, and configuration.
use thiserror::Error;

/// Top-level error type for the paging engine.
#[derive(Error, Debug)]
pub enum PagingError {
    /// Navigation target is outside the valid 1-based page range.
    #[error("page {page} out of range (valid: 1..={total_pages})")]
    OutOfRange { page: usize, total_pages: usize },

    /// The data source could not answer within its contract.
    ///
    /// Retryable: the viewport is left unchanged and the same navigation
    /// may be attempted again.
    #[error("data source unavailable: {0}")]
    DataUnavailable(String),

    /// Construction-time configuration rejection.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl PagingError {
    /// Whether the caller may retry the failed operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }
}
