//! Error types for gaze-flow

use thiserror::Error;

use crate::tree::TreeError;

/// Result type alias for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Main error type for flow operations
#[derive(Error, Debug)]
pub enum FlowError {
    /// The flow has no current question (not begun, or already complete).
    #[error("Flow is not awaiting an answer")]
    NotAwaitingAnswer,

    /// An answer arrived for a question other than the current one.
    #[error("Received answer for question {got} while awaiting {expected}")]
    UnexpectedQuestion { expected: String, got: String },

    /// Decision-tree lookup errors.
    #[error(transparent)]
    Tree(#[from] TreeError),
}
