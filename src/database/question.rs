use std::collections::BTreeSet;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Option numbers (1-based) a user picked, or that a question accepts.
pub type Selection = BTreeSet<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    uuid: Uuid,
    text: String,
    options: Vec<String>,
    correct: Selection,
}

/// On-disk shape of a question in a JSON bank file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuestionRecord {
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum InvalidQuestion {
    #[error("question has no options")]
    NoOptions,
    #[error("question has no correct answer")]
    NoCorrectAnswer,
    #[error("correct answer {0} is not among the options")]
    CorrectOutOfRange(usize),
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self::retreive(Uuid::new_v4(), text.into(), options, correct.into_iter().collect())
    }

    pub fn retreive(uuid: Uuid, text: String, options: Vec<String>, correct: Selection) -> Self {
        Self {
            uuid,
            text,
            options,
            correct,
        }
    }

    pub(crate) fn validate(self) -> Result<Self, InvalidQuestion> {
        if self.options.is_empty() {
            return Err(InvalidQuestion::NoOptions);
        }
        if self.correct.is_empty() {
            return Err(InvalidQuestion::NoCorrectAnswer);
        }
        if let Some(&n) = self
            .correct
            .iter()
            .find(|&&n| n == 0 || n > self.options.len())
        {
            return Err(InvalidQuestion::CorrectOutOfRange(n));
        }
        Ok(self)
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct(&self) -> &Selection {
        &self.correct
    }

    /// A question is answered correctly only when the picked options match
    /// the correct set exactly.
    pub fn is_correct(&self, selected: &Selection) -> bool {
        &self.correct == selected
    }
}

impl From<QuestionRecord> for Question {
    fn from(record: QuestionRecord) -> Self {
        Question::new(record.text, record.options, record.correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("option {i}")).collect()
    }

    #[test]
    fn test_validate_accepts_multi_answer() {
        let question = Question::new("q", options(4), [1, 3]).validate().unwrap();
        assert!(question.is_correct(&Selection::from([1, 3])));
        assert!(!question.is_correct(&Selection::from([1])));
        assert!(!question.is_correct(&Selection::from([1, 2, 3])));
    }

    #[test]
    fn test_validate_rejects_broken_records() {
        assert_eq!(
            Question::new("q", vec![], [1]).validate(),
            Err(InvalidQuestion::NoOptions)
        );
        assert_eq!(
            Question::new("q", options(3), []).validate(),
            Err(InvalidQuestion::NoCorrectAnswer)
        );
        assert_eq!(
            Question::new("q", options(3), [4]).validate(),
            Err(InvalidQuestion::CorrectOutOfRange(4))
        );
        assert_eq!(
            Question::new("q", options(3), [0]).validate(),
            Err(InvalidQuestion::CorrectOutOfRange(0))
        );
    }

    #[test]
    fn test_invalid_question_messages() {
        assert_eq!(
            InvalidQuestion::CorrectOutOfRange(5).to_string(),
            "correct answer 5 is not among the options"
        );
        assert_eq!(InvalidQuestion::NoOptions.to_string(), "question has no options");
    }
}
