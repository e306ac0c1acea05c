pub mod analysis;
pub mod chat;
pub mod goal;
pub mod item;
pub mod job;

pub use analysis::{AnalysisResult, Severity, NO_DEFECT};
pub use chat::{ChatMessage, MessageSender};
pub use goal::{GoalStatus, ProjectGoal};
pub use item::{CapturedItem, ItemMetadata, ItemStatus};
pub use job::JobHandle;
