pub mod aggregate;
pub mod report;
pub mod router;
pub mod store;

pub use aggregate::DatasetAggregate;
pub use report::generate_report;
pub use router::GoalRouter;
pub use store::{DatasetEvent, DatasetSnapshot, DatasetStore};
