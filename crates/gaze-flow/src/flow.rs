//! The classification flow state machine
//!
//! One flow per open classification view; flows never share accumulators.
//! The flow records answers, walks the decision tree, auto-skips the
//! discuss question when the user preference hides it, and hands a
//! snapshot to persistence exactly once per finished classification.
//!
//! State transitions:
//! ```text
//! Idle → AwaitingAnswer(first) → AwaitingAnswer(next) → ... → Complete
//!                  ↑                                             |
//!                  └──────────────── begin(next item) ───────────┘
//! ```
//!
//! Persisting the [`FlowOutcome::Finished`] record (via
//! `SubjectStore::commit_classification`) blocks and must run off the
//! interactive thread; the record is an owned copy, so the commit survives
//! the flow being dropped, and a new classification may begin while the
//! previous commit is still in flight.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use gaze_store::classification::ClassificationRecord;

use crate::classification::ClassificationInProgress;
use crate::error::{FlowError, Result};
use crate::tree::{DecisionTree, Question};

/// User preferences consulted by the flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowPrefs {
    /// When false, the discuss question is never presented; its "no"
    /// answer is recorded automatically instead.
    pub show_discuss_question: bool,
}

impl Default for FlowPrefs {
    fn default() -> Self {
        Self {
            show_discuss_question: true,
        }
    }
}

/// Where a flow currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// No classification in progress.
    Idle,
    /// Waiting for the user to answer the given question.
    AwaitingAnswer(String),
    /// A classification finished and its snapshot was handed out; the flow
    /// is ready for `begin`.
    Complete,
}

/// The result of recording one answer.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// Present the next question.
    Continue {
        next_question_id: String,
        /// The discuss question was answered "yes": the caller should open
        /// the discussion page. Informational only.
        discussion_requested: bool,
    },
    /// The classification is complete; persist `record` for `item_id` on a
    /// background context.
    Finished {
        item_id: i64,
        record: ClassificationRecord,
        discussion_requested: bool,
    },
    /// The classification ended with too few answers and was discarded.
    /// Not a user mistake; logged as an upstream anomaly.
    Abandoned { answers_recorded: usize },
}

/// State machine for one classification at a time.
pub struct ClassificationFlow {
    tree: Arc<DecisionTree>,
    prefs: FlowPrefs,
    state: FlowState,
    in_progress: ClassificationInProgress,
    item_id: Option<i64>,
}

impl ClassificationFlow {
    pub fn new(tree: Arc<DecisionTree>, prefs: FlowPrefs) -> Self {
        Self {
            tree,
            prefs,
            state: FlowState::Idle,
            in_progress: ClassificationInProgress::new(),
            item_id: None,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn item_id(&self) -> Option<i64> {
        self.item_id
    }

    /// The question to present, if the flow is awaiting an answer.
    pub fn current_question(&self) -> Option<&Question> {
        match &self.state {
            FlowState::AwaitingAnswer(question_id) => self.tree.question(question_id),
            _ => None,
        }
    }

    pub fn is_favorite(&self) -> bool {
        self.in_progress.favorite()
    }

    /// Toggleable at any point during the classification; persisted with
    /// the finished snapshot.
    pub fn set_favorite(&mut self, favorite: bool) {
        self.in_progress.set_favorite(favorite);
    }

    /// Start classifying an item, from the tree's first question.
    ///
    /// Allowed from any state: a previous classification's commit may still
    /// be in flight, and its snapshot is independent of this flow.
    pub fn begin(&mut self, item_id: i64) {
        self.in_progress.reset();
        self.item_id = Some(item_id);
        self.state = FlowState::AwaitingAnswer(self.tree.first_question().id.clone());
    }

    /// Wipe the in-progress classification and return to the first
    /// question for the same item.
    pub fn restart(&mut self) -> Result<()> {
        let item_id = self.item_id.ok_or(FlowError::NotAwaitingAnswer)?;
        self.begin(item_id);
        Ok(())
    }

    /// Record the user's answer to the current question.
    pub fn answer(
        &mut self,
        question_id: &str,
        answer_id: &str,
        checkbox_ids: Vec<String>,
    ) -> Result<FlowOutcome> {
        let (current, item_id) = match (&self.state, self.item_id) {
            (FlowState::AwaitingAnswer(id), Some(item_id)) => (id.clone(), item_id),
            _ => return Err(FlowError::NotAwaitingAnswer),
        };
        if question_id != current {
            return Err(FlowError::UnexpectedQuestion {
                expected: current,
                got: question_id.to_string(),
            });
        }

        let mut next = self
            .tree
            .next_question_for_answer(question_id, answer_id)?
            .map(|q| q.id.clone());
        self.in_progress.add(question_id, answer_id, checkbox_ids);

        let discussion_requested = self.tree.is_discuss_question(question_id)
            && self.tree.discuss_question_yes_answer_id() == Some(answer_id);

        // Skip the discuss question, depending on the preference: record a
        // "no" for it without ever presenting it, then keep walking.
        while let Some(next_id) = next.clone() {
            let Some(discuss) = self.tree.discuss_spec() else {
                break;
            };
            if next_id != discuss.question_id || self.prefs.show_discuss_question {
                break;
            }
            let no_answer = discuss.no_answer_id.clone();
            let after = self
                .tree
                .next_question_for_answer(&next_id, &no_answer)?
                .map(|q| q.id.clone());
            self.in_progress.add(&next_id, &no_answer, Vec::new());
            next = after;
        }

        match next {
            Some(next_id) => {
                self.state = FlowState::AwaitingAnswer(next_id.clone());
                Ok(FlowOutcome::Continue {
                    next_question_id: next_id,
                    discussion_requested,
                })
            }
            None => {
                if !self.in_progress.has_enough_answers() {
                    // An upstream inconsistency, not a user mistake: discard
                    // rather than persist a spurious classification.
                    let answers_recorded = self.in_progress.len();
                    warn!(
                        item_id,
                        answers = answers_recorded,
                        "abandoning classification with too few answers"
                    );
                    self.in_progress.reset();
                    self.item_id = None;
                    self.state = FlowState::Idle;
                    return Ok(FlowOutcome::Abandoned { answers_recorded });
                }

                let record = self.in_progress.snapshot();
                // Reset as soon as the snapshot is taken, never after the
                // commit: the flow is immediately reusable.
                self.in_progress.reset();
                self.item_id = None;
                self.state = FlowState::Complete;
                Ok(FlowOutcome::Finished {
                    item_id,
                    record,
                    discussion_requested,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Answer, DiscussSpec, Question, TreeConfig};

    fn answer(id: &str, leads_to: Option<&str>) -> Answer {
        Answer {
            id: id.into(),
            text: id.into(),
            icon: None,
            leads_to: leads_to.map(String::from),
        }
    }

    fn tree() -> Arc<DecisionTree> {
        let config = TreeConfig {
            first_question_id: "shape".into(),
            discuss: Some(DiscussSpec {
                question_id: "discuss".into(),
                yes_answer_id: "a-discuss-yes".into(),
                no_answer_id: "a-discuss-no".into(),
            }),
            questions: vec![
                Question {
                    id: "shape".into(),
                    title: "Shape".into(),
                    text: "Is the galaxy smooth?".into(),
                    checkboxes: vec![],
                    answers: vec![
                        answer("a-smooth", Some("roundness")),
                        answer("a-star", None),
                    ],
                },
                Question {
                    id: "roundness".into(),
                    title: "Roundness".into(),
                    text: "How rounded?".into(),
                    checkboxes: vec![],
                    answers: vec![answer("a-completely", Some("discuss"))],
                },
                Question {
                    id: "discuss".into(),
                    title: "Discuss".into(),
                    text: "Discuss this object?".into(),
                    checkboxes: vec![],
                    answers: vec![answer("a-discuss-yes", None), answer("a-discuss-no", None)],
                },
            ],
        };
        Arc::new(DecisionTree::new(config).unwrap())
    }

    fn flow_with_prefs(show_discuss: bool) -> ClassificationFlow {
        ClassificationFlow::new(
            tree(),
            FlowPrefs {
                show_discuss_question: show_discuss,
            },
        )
    }

    #[test]
    fn walks_to_completion() {
        let mut flow = flow_with_prefs(true);
        flow.begin(7);
        assert_eq!(flow.current_question().unwrap().id, "shape");

        let outcome = flow.answer("shape", "a-smooth", vec![]).unwrap();
        assert_eq!(
            outcome,
            FlowOutcome::Continue {
                next_question_id: "roundness".into(),
                discussion_requested: false,
            }
        );

        flow.answer("roundness", "a-completely", vec![]).unwrap();
        let outcome = flow.answer("discuss", "a-discuss-no", vec![]).unwrap();

        let FlowOutcome::Finished {
            item_id,
            record,
            discussion_requested,
        } = outcome
        else {
            panic!("expected Finished, got {:?}", outcome);
        };
        assert_eq!(item_id, 7);
        assert!(!discussion_requested);
        assert_eq!(record.answers.len(), 3);
        assert_eq!(record.answers[0].question_id, "shape");
        assert_eq!(record.answers[2].answer_id, "a-discuss-no");

        // The flow reset at snapshot time and is reusable immediately.
        assert_eq!(*flow.state(), FlowState::Complete);
        assert_eq!(flow.item_id(), None);
        flow.begin(8);
        assert_eq!(flow.current_question().unwrap().id, "shape");
    }

    #[test]
    fn discuss_yes_requests_discussion() {
        let mut flow = flow_with_prefs(true);
        flow.begin(1);
        flow.answer("shape", "a-smooth", vec![]).unwrap();
        flow.answer("roundness", "a-completely", vec![]).unwrap();
        let outcome = flow.answer("discuss", "a-discuss-yes", vec![]).unwrap();
        let FlowOutcome::Finished {
            discussion_requested,
            ..
        } = outcome
        else {
            panic!("expected Finished");
        };
        assert!(discussion_requested);
    }

    #[test]
    fn discuss_question_auto_skipped_when_hidden() {
        let mut flow = flow_with_prefs(false);
        flow.begin(1);
        flow.answer("shape", "a-smooth", vec![]).unwrap();

        // The discuss question never becomes the current question; its "no"
        // answer is recorded implicitly.
        let outcome = flow.answer("roundness", "a-completely", vec![]).unwrap();
        let FlowOutcome::Finished { record, .. } = outcome else {
            panic!("expected Finished");
        };
        assert_eq!(record.answers.len(), 3);
        assert_eq!(record.answers[2].question_id, "discuss");
        assert_eq!(record.answers[2].answer_id, "a-discuss-no");
    }

    #[test]
    fn too_few_answers_abandons_without_record() {
        let mut flow = flow_with_prefs(true);
        flow.begin(3);
        let outcome = flow.answer("shape", "a-star", vec![]).unwrap();
        assert_eq!(outcome, FlowOutcome::Abandoned { answers_recorded: 1 });
        assert_eq!(*flow.state(), FlowState::Idle);
        assert_eq!(flow.item_id(), None);
    }

    #[test]
    fn rejects_answer_for_wrong_question() {
        let mut flow = flow_with_prefs(true);
        flow.begin(1);
        let err = flow.answer("roundness", "a-completely", vec![]).unwrap_err();
        assert!(matches!(err, FlowError::UnexpectedQuestion { .. }));
        // The accumulator is untouched and the flow still awaits "shape".
        assert_eq!(flow.current_question().unwrap().id, "shape");
    }

    #[test]
    fn rejects_answer_when_idle() {
        let mut flow = flow_with_prefs(true);
        let err = flow.answer("shape", "a-smooth", vec![]).unwrap_err();
        assert!(matches!(err, FlowError::NotAwaitingAnswer));
    }

    #[test]
    fn unknown_answer_leaves_state_unchanged() {
        let mut flow = flow_with_prefs(true);
        flow.begin(1);
        let err = flow.answer("shape", "a-bogus", vec![]).unwrap_err();
        assert!(matches!(err, FlowError::Tree(_)));
        assert_eq!(flow.current_question().unwrap().id, "shape");

        // Still answerable afterwards.
        flow.answer("shape", "a-smooth", vec![]).unwrap();
        assert_eq!(flow.current_question().unwrap().id, "roundness");
    }

    #[test]
    fn restart_returns_to_first_question() {
        let mut flow = flow_with_prefs(true);
        flow.begin(5);
        flow.set_favorite(true);
        flow.answer("shape", "a-smooth", vec![]).unwrap();

        flow.restart().unwrap();
        assert_eq!(flow.current_question().unwrap().id, "shape");
        assert_eq!(flow.item_id(), Some(5));
        assert!(!flow.is_favorite());

        // Restart without an item is an error.
        let mut idle = flow_with_prefs(true);
        assert!(idle.restart().is_err());
    }

    #[test]
    fn favorite_flag_reaches_the_snapshot() {
        let mut flow = flow_with_prefs(true);
        flow.begin(2);
        flow.answer("shape", "a-smooth", vec![]).unwrap();
        flow.set_favorite(true);
        flow.answer("roundness", "a-completely", vec![]).unwrap();
        let outcome = flow.answer("discuss", "a-discuss-no", vec![]).unwrap();
        let FlowOutcome::Finished { record, .. } = outcome else {
            panic!("expected Finished");
        };
        assert!(record.favorite);
    }

    #[test]
    fn concurrent_flows_do_not_share_state() {
        let tree = tree();
        let mut a = ClassificationFlow::new(tree.clone(), FlowPrefs::default());
        let mut b = ClassificationFlow::new(tree, FlowPrefs::default());
        a.begin(1);
        b.begin(2);

        a.answer("shape", "a-smooth", vec![]).unwrap();
        assert_eq!(a.current_question().unwrap().id, "roundness");
        assert_eq!(b.current_question().unwrap().id, "shape");
        assert_eq!(b.item_id(), Some(2));
    }
}
