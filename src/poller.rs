use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::error::ClientError;

/// Work run on every poll tick
#[async_trait]
pub trait PollTask: Send + 'static {
    fn name(&self) -> &str;

    async fn tick(&mut self) -> Result<(), ClientError>;
}

/// Handle to a running poll loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    /// Run `task` now and then every `interval` until cancelled
    pub fn spawn<T: PollTask>(interval: Duration, mut task: T) -> Self {
        let period = interval.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                // First tick completes immediately
                ticker.tick().await;
                if let Err(e) = task.tick().await {
                    tracing::error!("Poll task '{}' failed: {}", task.name(), e);
                }
            }
        });
        tracing::debug!("Started poller with period {:?}", period);
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
