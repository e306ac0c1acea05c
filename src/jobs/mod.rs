pub mod media;
pub mod poller;

pub use media::{MediaJobStatus, MediaJobs};
pub use poller::{JobError, JobOutcome, JobPoller, DEFAULT_POLL_INTERVAL};
