use std::{future::Future, time::Duration};

use tokio::{task::JoinHandle, time::Instant};

/// One-shot countdown for a running test.
///
/// The callback runs in its own task once the limit passes, so cancelling
/// the timer from inside the callback (the session finishing itself) does
/// not interrupt it. Dropping the timer cancels it.
#[derive(Debug)]
pub struct TestTimer {
    deadline: Instant,
    handle: JoinHandle<()>,
}

impl TestTimer {
    pub fn start<F>(limit: Duration, on_timeout: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let deadline = Instant::now() + limit;
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            tokio::spawn(on_timeout);
        });

        Self { deadline, handle }
    }

    /// Safe to call any number of times, including after the timer fired.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

impl Drop for TestTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
