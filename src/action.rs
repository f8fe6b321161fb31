use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::catalog::{Difficulty, Specialization};

/// A button press, decoded from its callback token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectSpecialization(Specialization),
    SelectDifficulty(Difficulty),
    /// Option number on the current question, starting from 1.
    ToggleAnswer(usize),
    Next,
    ShowAnswers,
    GenerateCertificate,
    RepeatTest,
    MyStats,
    MainMenu,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unknown specialization '{0}'")]
    UnknownSpecialization(String),
    #[error("unknown difficulty '{0}'")]
    UnknownDifficulty(String),
    #[error("invalid answer number '{0}'")]
    InvalidAnswer(String),
    #[error("unknown action token '{0}'")]
    Unknown(String),
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let action = match token {
            "next" => Action::Next,
            "show_answers" => Action::ShowAnswers,
            "generate_cert" => Action::GenerateCertificate,
            "repeat_test" => Action::RepeatTest,
            "my_stats" => Action::MyStats,
            "main_menu" => Action::MainMenu,
            "help" => Action::Help,
            _ => {
                if let Some(slug) = token.strip_prefix("spec_") {
                    Specialization::from_slug(slug)
                        .map(Action::SelectSpecialization)
                        .ok_or_else(|| ActionError::UnknownSpecialization(slug.to_owned()))?
                } else if let Some(slug) = token.strip_prefix("diff_") {
                    Difficulty::from_slug(slug)
                        .map(Action::SelectDifficulty)
                        .ok_or_else(|| ActionError::UnknownDifficulty(slug.to_owned()))?
                } else if let Some(number) = token.strip_prefix("ans_") {
                    match number.parse::<usize>() {
                        Ok(n) if n > 0 => Action::ToggleAnswer(n),
                        _ => return Err(ActionError::InvalidAnswer(number.to_owned())),
                    }
                } else {
                    return Err(ActionError::Unknown(token.to_owned()));
                }
            }
        };

        Ok(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SelectSpecialization(spec) => write!(f, "spec_{}", spec.slug()),
            Action::SelectDifficulty(diff) => write!(f, "diff_{}", diff.slug()),
            Action::ToggleAnswer(n) => write!(f, "ans_{n}"),
            Action::Next => f.write_str("next"),
            Action::ShowAnswers => f.write_str("show_answers"),
            Action::GenerateCertificate => f.write_str("generate_cert"),
            Action::RepeatTest => f.write_str("repeat_test"),
            Action::MyStats => f.write_str("my_stats"),
            Action::MainMenu => f.write_str("main_menu"),
            Action::Help => f.write_str("help"),
        }
    }
}
