//! The in-progress classification accumulator
//!
//! Collects `(question, answer, checkboxes)` triples during one
//! classification, rather than inserting them along the way, so the store
//! never holds a half-complete classification. Serializable so UI state
//! can survive a view teardown and rebuild mid-classification.

use serde::{Deserialize, Serialize};

use gaze_store::classification::{AnswerEntry, ClassificationRecord};

/// Mutable accumulator for one classification in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationInProgress {
    answers: Vec<AnswerEntry>,
    favorite: bool,
}

impl ClassificationInProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one answered question in traversal order.
    pub fn add(&mut self, question_id: &str, answer_id: &str, checkbox_ids: Vec<String>) {
        self.answers.push(AnswerEntry {
            question_id: question_id.to_string(),
            answer_id: answer_id.to_string(),
            checkbox_ids,
        });
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// A lone answer is not a real classification. (The discuss answer is
    /// always recorded, even when auto-skipped, so a genuine classification
    /// has at least two entries.)
    pub fn has_enough_answers(&self) -> bool {
        self.answers.len() > 1
    }

    pub fn favorite(&self) -> bool {
        self.favorite
    }

    pub fn set_favorite(&mut self, favorite: bool) {
        self.favorite = favorite;
    }

    /// Take an independent, immutable copy for the hand-off to persistence.
    ///
    /// Neither side can reach the other's data through the copy, so the
    /// accumulator may be reset and reused while a commit of the snapshot
    /// is still in flight.
    pub fn snapshot(&self) -> ClassificationRecord {
        ClassificationRecord {
            answers: self.answers.clone(),
            favorite: self.favorite,
        }
    }

    /// Reset to empty, ready for the next classification.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.favorite = false;
    }
}
