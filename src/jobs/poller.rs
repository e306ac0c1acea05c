use std::future::Future;

use thiserror::Error;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;

use crate::models::JobHandle;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job finished and pointed at its artifact.
    Produced(String),
    /// The job finished without producing anything.
    Empty,
    /// Polling was abandoned through the cancellation token.
    Cancelled,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job submission failed: {0:#}")]
    Submit(anyhow::Error),

    #[error("job poll #{attempt} failed: {cause:#}")]
    Poll { attempt: u32, cause: anyhow::Error },
}

/// Drives a server-side job from submission to completion.
#[derive(Debug, Clone)]
pub struct JobPoller {
    interval: Duration,
    cancel_token: CancellationToken,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl JobPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Submits once, then waits `interval` before every poll until a handle
    /// reports `done`. Errors from either call end the run; cancellation ends
    /// it quietly with [`JobOutcome::Cancelled`] and no further calls.
    pub async fn run<S, SF, P, PF>(&self, submit: S, mut poll: P) -> Result<JobOutcome, JobError>
    where
        S: FnOnce() -> SF,
        SF: Future<Output = anyhow::Result<JobHandle>>,
        P: FnMut(JobHandle) -> PF,
        PF: Future<Output = anyhow::Result<JobHandle>>,
    {
        if self.cancel_token.is_cancelled() {
            return Ok(JobOutcome::Cancelled);
        }

        let submitted = tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => return Ok(JobOutcome::Cancelled),
            submitted = submit() => submitted,
        };
        let mut handle = submitted.map_err(JobError::Submit)?;
        log_info!("job {} submitted", handle.token);

        let mut attempt: u32 = 0;
        while !handle.done {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    log_info!("job {} polling cancelled", handle.token);
                    return Ok(JobOutcome::Cancelled);
                }
                _ = time::sleep(self.interval) => {}
            }

            attempt += 1;
            let token = handle.token.clone();
            let polled = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    log_info!("job {token} polling cancelled");
                    return Ok(JobOutcome::Cancelled);
                }
                polled = poll(handle) => polled,
            };
            handle = polled.map_err(|cause| JobError::Poll { attempt, cause })?;
            log_debug!("job {} poll #{attempt}: done={}", handle.token, handle.done);
        }

        match handle.result_ref {
            Some(result_ref) => {
                log_info!("job {} produced {result_ref}", handle.token);
                Ok(JobOutcome::Produced(result_ref))
            }
            None => {
                log_info!("job {} finished without a result", handle.token);
                Ok(JobOutcome::Empty)
            }
        }
    }
}
