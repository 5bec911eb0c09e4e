//! Decision-tree classification flow for the gaze classification suite
//!
//! Walks a user through the static question tree for one subject,
//! accumulates their answers, and hands a finished classification to
//! `gaze-store` for atomic persistence.

pub mod classification;
pub mod error;
pub mod flow;
pub mod tree;

pub use classification::*;
pub use error::*;
pub use flow::*;
pub use tree::*;

// The snapshot types live with the store, which consumes them.
pub use gaze_store::classification::{AnswerEntry, ClassificationRecord};
