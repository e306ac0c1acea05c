use std::{sync::Arc, time::Duration};

use anyhow::Result;

use crate::models::{AnalysisResult, CapturedItem, ChatMessage, JobHandle};

use super::{
    policy::{recover, with_deadline, Recovered},
    InferenceClient,
};

/// Hint shown in place of real guidance when a scan fails.
pub const GUIDANCE_UNAVAILABLE: &str = "Guidance unavailable";
pub const REPORT_FALLBACK: &str =
    "Unable to generate the dataset report right now. Please try again later.";
pub const CHAT_FALLBACK: &str = "Connection to Central interrupted.";

/// Upper bound on hints shown at once, whatever the settings ask for.
pub const MAX_HINTS: usize = 3;

/// Applies the engine's failure policy on top of an [`InferenceClient`].
///
/// Guidance, analysis, augmentation, reports and chat are best effort and
/// return [`Recovered`] values. Video jobs are load-bearing for the caller, so
/// their errors propagate untouched.
#[derive(Clone)]
pub struct InferenceGateway {
    client: Arc<dyn InferenceClient>,
    timeout: Option<Duration>,
    max_hints: usize,
}

impl InferenceGateway {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            client,
            timeout: None,
            max_hints: MAX_HINTS,
        }
    }

    /// Bounds every best-effort call; job calls are never timed out here.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Limits guidance to `max_hints`, capped at [`MAX_HINTS`].
    pub fn with_max_hints(mut self, max_hints: usize) -> Self {
        self.max_hints = max_hints.min(MAX_HINTS);
        self
    }

    pub async fn guidance(&self, frame: &[u8]) -> Recovered<Vec<String>> {
        let result =
            with_deadline("guidance", self.timeout, self.client.guidance(frame)).await;
        let max_hints = self.max_hints;
        recover("guidance", result, unavailable_hints).map(|hints| normalize_hints(hints, max_hints))
    }

    pub async fn analyze(&self, image: &[u8], context: &str) -> Recovered<AnalysisResult> {
        let result =
            with_deadline("analysis", self.timeout, self.client.analyze(image, context)).await;
        recover("analysis", result, AnalysisResult::fallback).map(|mut analysis| {
            analysis.clamp_confidence();
            analysis
        })
    }

    pub async fn augment(&self, image: &[u8], highlight_prompt: &str) -> Recovered<Option<Vec<u8>>> {
        let result = with_deadline(
            "augmentation",
            self.timeout,
            self.client.augment(image, highlight_prompt),
        )
        .await;
        recover("augmentation", result, || None)
    }

    pub async fn report(&self, items: &[CapturedItem]) -> Recovered<String> {
        let result = with_deadline("report", self.timeout, self.client.report(items)).await;
        recover("report", result, || REPORT_FALLBACK.to_string())
    }

    pub async fn chat_turn(&self, history: &[ChatMessage], message: &str) -> Recovered<String> {
        let result = with_deadline(
            "chat turn",
            self.timeout,
            self.client.chat_turn(history, message),
        )
        .await;
        recover("chat turn", result, || CHAT_FALLBACK.to_string())
    }

    pub async fn submit_video_job(&self, image: &[u8], prompt: &str) -> Result<JobHandle> {
        self.client.submit_video_job(image, prompt).await
    }

    pub async fn poll_video_job(&self, handle: JobHandle) -> Result<JobHandle> {
        self.client.poll_video_job(handle).await
    }
}

fn unavailable_hints() -> Vec<String> {
    vec![GUIDANCE_UNAVAILABLE.to_string()]
}

fn normalize_hints(hints: Vec<String>, max_hints: usize) -> Vec<String> {
    hints
        .into_iter()
        .map(|hint| hint.trim().to_string())
        .filter(|hint| !hint.is_empty())
        .take(max_hints)
        .collect()
}
