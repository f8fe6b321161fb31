//! Collaborators the bot calls into but does not implement yet. The stubs
//! keep the call sites final: swapping in a real service only means a new
//! implementation of the trait.

use std::future::Future;

use thiserror::Error;

use crate::session::TestOutcome;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} is not available yet")]
    Unavailable(&'static str),
}

/// Aggregated results of a user, as shown by "my stats".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSummary {
    pub attempts: usize,
    pub best_percent: usize,
}

pub trait IssueCertificate: Send + Sync + 'static {
    /// Renders a PDF certificate for a finished attempt.
    fn issue(&self, outcome: &TestOutcome) -> impl Future<Output = Result<Vec<u8>, ServiceError>> + Send;
}

pub trait RecordStats: Send + Sync + 'static {
    fn record(&self, outcome: &TestOutcome) -> impl Future<Output = Result<(), ServiceError>> + Send;

    fn summary(&self, user_id: u64) -> impl Future<Output = Result<StatsSummary, ServiceError>> + Send;
}

#[derive(Debug, Default)]
pub struct NoopCertificates;

impl IssueCertificate for NoopCertificates {
    async fn issue(&self, outcome: &TestOutcome) -> Result<Vec<u8>, ServiceError> {
        log::info!(
            "{}: certificate requested for '{}' ({}%)",
            outcome.user_id,
            outcome.specialization.slug(),
            outcome.percent()
        );
        Err(ServiceError::Unavailable("certificate generation"))
    }
}

#[derive(Debug, Default)]
pub struct NoopStats;

impl RecordStats for NoopStats {
    async fn record(&self, outcome: &TestOutcome) -> Result<(), ServiceError> {
        log::debug!(
            "{}: not persisting result {}/{} for '{}'",
            outcome.user_id,
            outcome.correct,
            outcome.total,
            outcome.specialization.slug()
        );
        Ok(())
    }

    async fn summary(&self, user_id: u64) -> Result<StatsSummary, ServiceError> {
        log::info!("{}: statistics requested", user_id);
        Err(ServiceError::Unavailable("statistics"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::oko_basic;

    #[tokio::test]
    async fn test_stubs_report_unavailable() {
        let outcome = oko_basic().outcome();

        assert!(matches!(
            NoopCertificates.issue(&outcome).await,
            Err(ServiceError::Unavailable(_))
        ));
        assert!(NoopStats.record(&outcome).await.is_ok());
        assert!(matches!(
            NoopStats.summary(outcome.user_id).await,
            Err(ServiceError::Unavailable(_))
        ));
    }
}
