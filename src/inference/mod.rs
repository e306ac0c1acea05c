//! Boundary to the AI service.
//!
//! [`InferenceClient`] is implemented by whatever adapter talks to the model
//! provider; it reports failures plainly. The rest of the engine never calls it
//! directly but goes through [`InferenceGateway`], which decides per operation
//! whether a failure is recovered with a fallback value or propagated.

pub mod gateway;
pub mod policy;
pub mod response;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{AnalysisResult, CapturedItem, ChatMessage, JobHandle};

pub use gateway::{InferenceGateway, CHAT_FALLBACK, GUIDANCE_UNAVAILABLE, MAX_HINTS, REPORT_FALLBACK};
pub use policy::Recovered;

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Short imperative framing hints for a down-scaled viewfinder frame.
    async fn guidance(&self, frame: &[u8]) -> Result<Vec<String>>;

    async fn analyze(&self, image: &[u8], context: &str) -> Result<AnalysisResult>;

    /// Returns an annotated copy of `image`, or `None` when the response held
    /// no image data.
    async fn augment(&self, image: &[u8], highlight_prompt: &str) -> Result<Option<Vec<u8>>>;

    async fn submit_video_job(&self, image: &[u8], prompt: &str) -> Result<JobHandle>;

    async fn poll_video_job(&self, handle: JobHandle) -> Result<JobHandle>;

    async fn report(&self, items: &[CapturedItem]) -> Result<String>;

    async fn chat_turn(&self, history: &[ChatMessage], message: &str) -> Result<String>;
}
