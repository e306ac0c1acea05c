pub mod coordinator;

pub use coordinator::{ChatCoordinator, ChatError};
