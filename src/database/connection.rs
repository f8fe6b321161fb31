use std::borrow::Cow;

use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::question::Question;
use super::{BankError, RetreiveQuestions};
use crate::catalog::Specialization;

pub(crate) struct Connection {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct QuestionRow {
    id: Uuid,
    text: String,
    options: Vec<String>,
    correct: Vec<i32>,
}

impl Connection {
    pub(crate) async fn connect<'a>(connection_string: Cow<'a, str>) -> Result<Self, BankError> {
        let pool = PgPool::connect(&connection_string).await?;
        Ok(Self { pool })
    }

    pub(crate) async fn perform_migrations_if_needed(&self) -> Result<(), BankError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = 'questions')",
        )
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            log::info!("Question tables not found, running migrations");
            sqlx::migrate!().run(&self.pool).await?;
        }
        Ok(())
    }
}

impl RetreiveQuestions for Connection {
    async fn retreive_pool(&self, specialization: Specialization) -> Result<Vec<Question>, BankError> {
        log::debug!("Fetching question pool for {}", specialization.slug());
        let rows = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, text, options, correct FROM questions WHERE specialization = $1",
        )
        .bind(specialization.slug())
        .fetch_all(&self.pool)
        .await?;

        let questions = rows
            .into_iter()
            .map(|row| {
                let correct = row
                    .correct
                    .into_iter()
                    // a negative number can never match an option, map it to 0 so validation drops it
                    .map(|n| usize::try_from(n).unwrap_or(0))
                    .collect();
                Question::retreive(row.id, row.text, row.options, correct)
            })
            .collect();

        Ok(questions)
    }
}
