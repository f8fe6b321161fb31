use std::{future::Future, path::PathBuf};

use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

use crate::catalog::{Difficulty, Specialization};

pub mod connection;
pub mod files;
pub mod question;

use connection::Connection;
use files::FileBank;
use question::Question;

#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed question file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub(crate) trait RetreiveQuestions: Send + Sync {
    /// Every stored question of a specialization, in storage order.
    fn retreive_pool(
        &self,
        specialization: Specialization,
    ) -> impl Future<Output = Result<Vec<Question>, BankError>> + Send;
}

/// Where question pools come from, picked once at startup.
pub(crate) enum QuestionBank {
    Files(FileBank),
    Postgres(Connection),
}

impl RetreiveQuestions for QuestionBank {
    async fn retreive_pool(&self, specialization: Specialization) -> Result<Vec<Question>, BankError> {
        match self {
            QuestionBank::Files(bank) => bank.retreive_pool(specialization).await,
            QuestionBank::Postgres(bank) => bank.retreive_pool(specialization).await,
        }
    }
}

/// Loads the questions for one test attempt.
///
/// Returns an empty list when the pool is missing, unreadable or contains no
/// valid questions; the caller must abort the test in that case.
pub(crate) async fn load<Bank: RetreiveQuestions>(
    bank: &Bank,
    specialization: Specialization,
    difficulty: Difficulty,
    requester_id: u64,
) -> Vec<Question> {
    let pool = match bank.retreive_pool(specialization).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!(
                "Failed to load '{}' questions for {}: {}",
                specialization.slug(),
                requester_id,
                e
            );
            return Vec::new();
        }
    };

    let pool: Vec<Question> = pool
        .into_iter()
        .filter_map(|question| {
            let uuid = *question.uuid();
            question
                .validate()
                .map_err(|e| log::warn!("Skipping question {uuid} of '{}': {e}", specialization.slug()))
                .ok()
        })
        .collect();

    let questions = select(pool, difficulty.question_count(), &mut rand::thread_rng());
    log::info!(
        "{}: loaded {} '{}' questions at {} level",
        requester_id,
        questions.len(),
        specialization.slug(),
        difficulty.slug()
    );
    questions
}

/// Shuffles the pool and keeps at most `count` questions. A pool smaller
/// than `count` is served whole.
pub(crate) fn select<R: Rng + ?Sized>(mut pool: Vec<Question>, count: usize, rng: &mut R) -> Vec<Question> {
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    struct StaticBank(Vec<Question>);

    impl RetreiveQuestions for StaticBank {
        async fn retreive_pool(&self, _: Specialization) -> Result<Vec<Question>, BankError> {
            Ok(self.0.clone())
        }
    }

    fn pool(size: usize) -> Vec<Question> {
        (1..=size)
            .map(|i| Question::new(format!("Вопрос {i}"), vec!["да".into(), "нет".into()], [1]))
            .collect()
    }

    #[test]
    fn test_select_truncates_to_tier_count() {
        let mut rng = StdRng::seed_from_u64(7);
        for difficulty in Difficulty::ALL {
            let questions = select(pool(80), difficulty.question_count(), &mut rng);
            assert_eq!(questions.len(), difficulty.question_count());

            let unique: HashSet<_> = questions.iter().map(|q| *q.uuid()).collect();
            assert_eq!(unique.len(), questions.len());
        }
    }

    #[test]
    fn test_select_serves_whole_small_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        let questions = select(pool(12), Difficulty::Advanced.question_count(), &mut rng);
        assert_eq!(questions.len(), 12);
    }

    #[tokio::test]
    async fn test_load_skips_invalid_questions() {
        let mut questions = pool(3);
        questions.push(Question::new("broken", vec!["a".into()], [2]));
        questions.push(Question::new("empty", vec![], [1]));
        let bank = StaticBank(questions);

        let loaded = load(&bank, Specialization::Oko, Difficulty::Reserve, 42).await;
        assert_eq!(loaded.len(), 3);
        assert!(loaded.iter().all(|q| q.text().starts_with("Вопрос")));
    }

    #[tokio::test]
    async fn test_load_empty_pool() {
        let bank = StaticBank(Vec::new());
        let loaded = load(&bank, Specialization::Oko, Difficulty::Basic, 42).await;
        assert!(loaded.is_empty());
    }
}
