use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::Serialize;
use tokio::{sync::watch, time::Duration};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::inference::InferenceGateway;

use super::poller::{JobError, JobOutcome, JobPoller};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "status")]
pub enum MediaJobStatus {
    Running,
    Succeeded { result_ref: String },
    NoResult,
    Failed { message: String },
    Cancelled,
}

impl MediaJobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, MediaJobStatus::Running)
    }
}

struct MediaJobEntry {
    status: watch::Receiver<MediaJobStatus>,
    cancel_token: CancellationToken,
}

/// Runs video-synthesis jobs in the background and tracks their status.
///
/// Every job polls under a child of one root token, so [`MediaJobs::shutdown`]
/// abandons all of them at once.
#[derive(Clone)]
pub struct MediaJobs {
    gateway: InferenceGateway,
    poll_interval: Duration,
    root_token: CancellationToken,
    jobs: Arc<Mutex<HashMap<String, MediaJobEntry>>>,
}

impl MediaJobs {
    pub fn new(gateway: InferenceGateway, poll_interval: Duration) -> Self {
        Self {
            gateway,
            poll_interval,
            root_token: CancellationToken::new(),
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Runs a video job to completion on the caller's task.
    pub async fn generate_video(&self, image: &[u8], prompt: &str) -> Result<JobOutcome, JobError> {
        let poller = JobPoller::new(self.poll_interval).with_cancellation(self.root_token.child_token());
        run_video_job(&poller, &self.gateway, image, prompt).await
    }

    /// Starts a video job in the background and returns its id. Bookkeeping
    /// for jobs that already finished is dropped first.
    pub fn start_video(&self, image: Vec<u8>, prompt: impl Into<String>) -> String {
        let job_id = Uuid::new_v4().to_string();
        let prompt = prompt.into();
        let cancel_token = self.root_token.child_token();
        let (status_tx, status_rx) = watch::channel(MediaJobStatus::Running);

        self.prune_finished();
        self.lock().insert(
            job_id.clone(),
            MediaJobEntry {
                status: status_rx,
                cancel_token: cancel_token.clone(),
            },
        );

        let poller = JobPoller::new(self.poll_interval).with_cancellation(cancel_token);
        let gateway = self.gateway.clone();
        let id = job_id.clone();
        tokio::spawn(async move {
            let status = match run_video_job(&poller, &gateway, &image, &prompt).await {
                Ok(JobOutcome::Produced(result_ref)) => MediaJobStatus::Succeeded { result_ref },
                Ok(JobOutcome::Empty) => MediaJobStatus::NoResult,
                Ok(JobOutcome::Cancelled) => MediaJobStatus::Cancelled,
                Err(err) => {
                    log_error!("video job {id} failed: {err}");
                    MediaJobStatus::Failed {
                        message: format!("operation failed: {err}"),
                    }
                }
            };
            log_info!("video job {id} finished: {status:?}");
            let _ = status_tx.send(status);
        });

        log_info!("video job {job_id} started");
        job_id
    }

    pub fn status(&self, job_id: &str) -> Option<MediaJobStatus> {
        self.lock()
            .get(job_id)
            .map(|entry| entry.status.borrow().clone())
    }

    pub fn watch(&self, job_id: &str) -> Option<watch::Receiver<MediaJobStatus>> {
        self.lock().get(job_id).map(|entry| entry.status.clone())
    }

    /// Returns false for unknown job ids.
    pub fn cancel(&self, job_id: &str) -> bool {
        match self.lock().get(job_id) {
            Some(entry) => {
                entry.cancel_token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drops bookkeeping for jobs that have finished.
    pub fn prune_finished(&self) {
        self.lock()
            .retain(|_, entry| !entry.status.borrow().is_finished());
    }

    /// Abandons every running job. Idempotent.
    pub fn shutdown(&self) {
        self.root_token.cancel();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MediaJobEntry>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_video_job(
    poller: &JobPoller,
    gateway: &InferenceGateway,
    image: &[u8],
    prompt: &str,
) -> Result<JobOutcome, JobError> {
    poller
        .run(
            move || gateway.submit_video_job(image, prompt),
            move |handle| gateway.poll_video_job(handle),
        )
        .await
}
