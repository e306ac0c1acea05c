pub mod session;
pub mod state;

pub use session::{highlight_prompt, CaptureContext, CaptureError, CaptureSession};
pub use state::{CaptureSnapshot, CaptureState};
