use std::{io::ErrorKind, path::PathBuf};

use super::question::{Question, QuestionRecord};
use super::{BankError, RetreiveQuestions};
use crate::catalog::Specialization;

/// Question pools stored as `<dir>/<specialization>.json`.
#[derive(Debug, Clone)]
pub(crate) struct FileBank {
    dir: PathBuf,
}

impl FileBank {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn pool_path(&self, specialization: Specialization) -> PathBuf {
        self.dir.join(format!("{}.json", specialization.slug()))
    }

    /// Specializations without a pool file. Their tests cannot start until
    /// a file is provided.
    pub(crate) async fn missing_pools(&self) -> Vec<Specialization> {
        let mut missing = Vec::new();
        for specialization in Specialization::ALL {
            let exists = tokio::fs::try_exists(self.pool_path(specialization))
                .await
                .unwrap_or(false);
            if !exists {
                missing.push(specialization);
            }
        }
        missing
    }
}

impl RetreiveQuestions for FileBank {
    async fn retreive_pool(&self, specialization: Specialization) -> Result<Vec<Question>, BankError> {
        let path = self.pool_path(specialization);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("No question file at {}", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(BankError::Io { path, source: e }),
        };

        let records: Vec<QuestionRecord> =
            serde_json::from_str(&raw).map_err(|source| BankError::Json { path, source })?;

        Ok(records.into_iter().map(Question::from).collect())
    }
}
