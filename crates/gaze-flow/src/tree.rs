//! The static classification decision tree
//!
//! Loaded once from configuration at startup and shared immutably between
//! flows (wrap it in an `Arc`); traversal is a pure function of
//! (question, answer). One question may be designated the "discuss"
//! question, which the flow can auto-answer "no" when the user preference
//! hides it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or traversing a decision tree.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Decision tree parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate question id: {0}")]
    DuplicateQuestion(String),

    #[error("Unknown question id: {0}")]
    UnknownQuestion(String),

    #[error("Question {question} has no answer {answer}")]
    UnknownAnswer { question: String, answer: String },

    #[error("Answer {answer} of question {question} leads to missing question {target}")]
    MissingTarget {
        question: String,
        answer: String,
        target: String,
    },

    #[error("Invalid discuss question: {0}")]
    InvalidDiscuss(String),
}

/// A multi-select option shown above a question's answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkbox {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// One selectable answer; `leads_to` names the follow-up question, or is
/// absent when choosing this answer completes the classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub leads_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub checkboxes: Vec<Checkbox>,
    pub answers: Vec<Answer>,
}

impl Question {
    pub fn has_checkboxes(&self) -> bool {
        !self.checkboxes.is_empty()
    }

    pub fn answer(&self, answer_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == answer_id)
    }
}

/// Designates the optional discuss question and its yes/no answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussSpec {
    pub question_id: String,
    pub yes_answer_id: String,
    pub no_answer_id: String,
}

/// The raw, serializable tree configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub first_question_id: String,
    #[serde(default)]
    pub discuss: Option<DiscussSpec>,
    pub questions: Vec<Question>,
}

/// A validated, immutable decision tree.
pub struct DecisionTree {
    config: TreeConfig,
    index: HashMap<String, usize>,
    first: usize,
}

impl DecisionTree {
    /// Load and validate a tree from its JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        let config: TreeConfig = serde_json::from_str(json)?;
        Self::new(config)
    }

    /// Validate a tree configuration: unique question ids, an existing
    /// first question, every answer target present, and a well-formed
    /// discuss designation if one is configured.
    pub fn new(config: TreeConfig) -> Result<Self, TreeError> {
        let mut index = HashMap::new();
        for (i, question) in config.questions.iter().enumerate() {
            if index.insert(question.id.clone(), i).is_some() {
                return Err(TreeError::DuplicateQuestion(question.id.clone()));
            }
        }

        let first = *index
            .get(&config.first_question_id)
            .ok_or_else(|| TreeError::UnknownQuestion(config.first_question_id.clone()))?;

        for question in &config.questions {
            for answer in &question.answers {
                if let Some(target) = &answer.leads_to {
                    if !index.contains_key(target) {
                        return Err(TreeError::MissingTarget {
                            question: question.id.clone(),
                            answer: answer.id.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }

        if let Some(discuss) = &config.discuss {
            let question = index
                .get(&discuss.question_id)
                .map(|i| &config.questions[*i])
                .ok_or_else(|| {
                    TreeError::InvalidDiscuss(format!(
                        "question {} does not exist",
                        discuss.question_id
                    ))
                })?;
            for answer_id in [&discuss.yes_answer_id, &discuss.no_answer_id] {
                if question.answer(answer_id).is_none() {
                    return Err(TreeError::InvalidDiscuss(format!(
                        "question {} has no answer {}",
                        discuss.question_id, answer_id
                    )));
                }
            }
            if discuss.yes_answer_id == discuss.no_answer_id {
                return Err(TreeError::InvalidDiscuss(
                    "yes and no answers must differ".into(),
                ));
            }
        }

        Ok(Self {
            config,
            index,
            first,
        })
    }

    pub fn first_question(&self) -> &Question {
        &self.config.questions[self.first]
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.index
            .get(question_id)
            .map(|i| &self.config.questions[*i])
    }

    /// The question that follows the given answer, or `None` when that
    /// answer completes the classification.
    pub fn next_question_for_answer(
        &self,
        question_id: &str,
        answer_id: &str,
    ) -> Result<Option<&Question>, TreeError> {
        let question = self
            .question(question_id)
            .ok_or_else(|| TreeError::UnknownQuestion(question_id.to_string()))?;
        let answer = question
            .answer(answer_id)
            .ok_or_else(|| TreeError::UnknownAnswer {
                question: question_id.to_string(),
                answer: answer_id.to_string(),
            })?;

        match &answer.leads_to {
            None => Ok(None),
            Some(target) => self
                .question(target)
                .map(Some)
                .ok_or_else(|| TreeError::MissingTarget {
                    question: question_id.to_string(),
                    answer: answer_id.to_string(),
                    target: target.clone(),
                }),
        }
    }

    pub fn discuss_spec(&self) -> Option<&DiscussSpec> {
        self.config.discuss.as_ref()
    }

    pub fn is_discuss_question(&self, question_id: &str) -> bool {
        self.config
            .discuss
            .as_ref()
            .map(|d| d.question_id == question_id)
            .unwrap_or(false)
    }

    pub fn discuss_question_yes_answer_id(&self) -> Option<&str> {
        self.config.discuss.as_ref().map(|d| d.yes_answer_id.as_str())
    }

    pub fn discuss_question_no_answer_id(&self) -> Option<&str> {
        self.config.discuss.as_ref().map(|d| d.no_answer_id.as_str())
    }
}
