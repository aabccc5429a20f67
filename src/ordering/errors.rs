//! # Ordering Errors

use thiserror::Error;

/// Result type for ordering plans
pub type OrderingResult<T> = Result<T, OrderingError>;

/// The only ways a plan can be refused. Both are caller errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderingError {
    #[error("Position {position} out of range (max: {max})")]
    PositionOutOfRange { position: usize, max: usize },

    /// The record being placed is already part of the sequence
    #[error("Record already in sequence: {0}")]
    DuplicateRecord(String),
}

impl OrderingError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        400
    }
}
