//! The immutable classification snapshot handed to the batch writer

use serde::{Deserialize, Serialize};

/// One answered question: the question, the chosen answer, and any
/// checkboxes that were selected before answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_id: String,
    pub answer_id: String,
    #[serde(default)]
    pub checkbox_ids: Vec<String>,
}

/// A finished classification, in traversal order, plus the favorite flag.
///
/// This is the value that crosses the concurrency boundary into the batch
/// writer: an owned, independent copy that neither side mutates after the
/// hand-off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub answers: Vec<AnswerEntry>,
    pub favorite: bool,
}

impl ClassificationRecord {
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
