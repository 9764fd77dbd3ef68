//! Caller-visible flow errors

use super::traits::{AuthFailure, StoreError};
use crate::state_machine::TransitionError;
use thiserror::Error;

/// Error returned by every flow operation
#[derive(Debug, Error)]
pub enum FlowError {
    /// Identity or phone did not match; nothing was created
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthFailure),

    /// The id is unknown to both the registry and the durable store
    #[error("Conversation not found: {0}")]
    NotFound(String),

    /// Tool called out of order, or on a logged-out conversation
    #[error(transparent)]
    Precondition(#[from] TransitionError),

    /// The external service could not record the submission
    #[error("Submission was not recorded ({retries_left} retries left): {message}")]
    Persistence { message: String, retries_left: u32 },

    /// State could not be read or written at all
    #[error("State storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl FlowError {
    /// Stable classification used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::Authentication(_) => "authentication",
            FlowError::NotFound(_) => "not_found",
            FlowError::Precondition(_) => "precondition",
            FlowError::Persistence { .. } => "persistence",
            FlowError::Storage(_) => "storage",
        }
    }
}
