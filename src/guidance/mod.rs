pub mod controller;
pub mod frame;
mod loop_worker;
mod publisher;

pub use controller::GuidanceScanner;
pub use frame::encode_guidance_frame;
pub use publisher::HintSet;
