#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use image::DynamicImage;
use tokio::sync::Semaphore;

use fieldlens::{
    dataset::{DatasetStore, GoalRouter},
    device::FrameSource,
    inference::{InferenceClient, InferenceGateway},
    models::{AnalysisResult, CapturedItem, ChatMessage, JobHandle, Severity},
    settings::GoalSettings,
};

/// Store seeded with the default rust and general goals.
pub fn dataset() -> DatasetStore {
    let settings = GoalSettings::default();
    let goals = settings.seeds.iter().map(|seed| seed.to_goal()).collect();
    DatasetStore::new(goals, GoalRouter::from_settings(&settings))
}

pub fn goal_count(store: &DatasetStore, goal_id: &str) -> u32 {
    store
        .goals()
        .into_iter()
        .find(|goal| goal.id == goal_id)
        .map(|goal| goal.current_count)
        .expect("goal is tracked")
}

pub fn analysis(defect_type: &str, sufficient: bool) -> AnalysisResult {
    AnalysisResult {
        defect_type: defect_type.into(),
        severity: Severity::Medium,
        confidence: 82.0,
        instructions: "Log and monitor".into(),
        is_quality_sufficient: sufficient,
        missing_angles: Vec::new(),
    }
}

/// Scriptable stand-in for the AI service that records every call it gets.
#[derive(Default)]
pub struct FakeInference {
    pub log: Mutex<Vec<&'static str>>,
    pub guidance_calls: AtomicUsize,
    pub guidance_returned: AtomicUsize,
    pub analyze_calls: AtomicUsize,
    pub augment_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub report_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,

    /// `None` makes the call fail.
    pub hints: Mutex<Option<Vec<String>>>,
    pub analysis: Mutex<Option<AnalysisResult>>,
    pub overlay: Mutex<Option<Vec<u8>>>,
    pub augment_fails: AtomicBool,
    pub chat_reply: Mutex<Option<String>>,
    pub report_text: Mutex<Option<String>>,
    pub submit_handle: Mutex<Option<JobHandle>>,
    pub poll_script: Mutex<VecDeque<Result<JobHandle, String>>>,
    pub last_chat_history: Mutex<Vec<ChatMessage>>,
    pub last_augment_prompt: Mutex<Option<String>>,

    /// Per-call response delays for guidance, consumed in call order.
    pub guidance_delays: Mutex<VecDeque<Duration>>,
    /// When set, guidance calls wait for a permit before answering.
    pub guidance_gate: Option<Arc<Semaphore>>,
    /// When set, chat calls wait for a permit before answering.
    pub chat_gate: Option<Arc<Semaphore>>,
}

impl FakeInference {
    pub fn healthy() -> Self {
        Self {
            hints: Mutex::new(Some(vec!["Move closer".into(), "Reduce glare".into()])),
            analysis: Mutex::new(Some(analysis("Surface Rust", true))),
            overlay: Mutex::new(Some(vec![0xAB, 0xCD])),
            chat_reply: Mutex::new(Some("Copy that.".into())),
            report_text: Mutex::new(Some("All nominal.".into())),
            submit_handle: Mutex::new(Some(JobHandle::pending("op-1"))),
            ..Default::default()
        }
    }

    pub fn with_analysis(self, result: Option<AnalysisResult>) -> Self {
        *self.analysis.lock().unwrap() = result;
        self
    }

    pub fn with_hints(self, hints: Option<Vec<String>>) -> Self {
        *self.hints.lock().unwrap() = hints;
        self
    }

    pub fn with_guidance_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.guidance_gate = Some(gate);
        self
    }

    pub fn with_guidance_delays(self, delays: Vec<Duration>) -> Self {
        *self.guidance_delays.lock().unwrap() = delays.into();
        self
    }

    pub fn with_chat_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.chat_gate = Some(gate);
        self
    }

    pub fn with_poll_script(self, script: Vec<Result<JobHandle, String>>) -> Self {
        *self.poll_script.lock().unwrap() = script.into();
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str, counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(call);
    }
}

#[async_trait]
impl InferenceClient for FakeInference {
    async fn guidance(&self, frame: &[u8]) -> Result<Vec<String>> {
        self.record("guidance", &self.guidance_calls);
        assert!(!frame.is_empty(), "guidance frame should be encoded");
        if let Some(gate) = &self.guidance_gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        let delay = self.guidance_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.guidance_returned.fetch_add(1, Ordering::SeqCst);
        self.hints
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("guidance backend unavailable"))
    }

    async fn analyze(&self, image: &[u8], _context: &str) -> Result<AnalysisResult> {
        self.record("analyze", &self.analyze_calls);
        assert!(!image.is_empty());
        self.analysis
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("model returned malformed JSON"))
    }

    async fn augment(&self, _image: &[u8], highlight_prompt: &str) -> Result<Option<Vec<u8>>> {
        self.record("augment", &self.augment_calls);
        *self.last_augment_prompt.lock().unwrap() = Some(highlight_prompt.to_string());
        if self.augment_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("image edit failed"));
        }
        Ok(self.overlay.lock().unwrap().clone())
    }

    async fn submit_video_job(&self, _image: &[u8], _prompt: &str) -> Result<JobHandle> {
        self.record("submit", &self.submit_calls);
        self.submit_handle
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("video quota exceeded"))
    }

    async fn poll_video_job(&self, handle: JobHandle) -> Result<JobHandle> {
        self.record("poll", &self.poll_calls);
        match self.poll_script.lock().unwrap().pop_front() {
            Some(Ok(next)) => Ok(next),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(handle),
        }
    }

    async fn report(&self, _items: &[CapturedItem]) -> Result<String> {
        self.record("report", &self.report_calls);
        self.report_text
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("report backend unavailable"))
    }

    async fn chat_turn(&self, history: &[ChatMessage], _message: &str) -> Result<String> {
        self.record("chat", &self.chat_calls);
        *self.last_chat_history.lock().unwrap() = history.to_vec();
        if let Some(gate) = &self.chat_gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        self.chat_reply
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("chat backend unavailable"))
    }
}

pub fn gateway(fake: &Arc<FakeInference>) -> InferenceGateway {
    InferenceGateway::new(fake.clone() as Arc<dyn InferenceClient>)
}

/// Camera stand-in producing a plain 640x480 viewfinder frame.
#[derive(Default)]
pub struct FakeCamera {
    pub fail_still: AtomicBool,
    pub fail_frames: AtomicBool,
    pub stills: AtomicUsize,
}

impl FrameSource for FakeCamera {
    fn sample_frame(&self) -> Result<DynamicImage> {
        if self.fail_frames.load(Ordering::SeqCst) {
            return Err(anyhow!("video track ended"));
        }
        Ok(DynamicImage::new_rgb8(640, 480))
    }

    fn capture_still(&self) -> Result<Vec<u8>> {
        if self.fail_still.load(Ordering::SeqCst) {
            return Err(anyhow!("camera permission revoked"));
        }
        self.stills.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0x02])
    }
}
