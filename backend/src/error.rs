//! Error types for the prediction engine.

/// Result type for engine operations
pub type PredictionResult<T> = Result<T, PredictionError>;

/// Error type for prediction operations.
///
/// Batch generators record [`PredictionError::InsufficientData`] as a
/// skipped step and keep going; any other variant aborts the whole batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    /// Too few comparable historical observations for a base estimate.
    #[error("Insufficient data: found {found} comparable observations, need at least {required}")]
    InsufficientData { found: usize, required: usize },

    /// Caller supplied an argument outside the accepted domain.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A distribution could not be evaluated.
    #[error("Statistics error: {0}")]
    Statistics(String),
}

impl PredictionError {
    /// Whether the failure is the recoverable "not enough history" case.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}
