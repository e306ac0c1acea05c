pub mod capture;
pub mod chat;
pub mod dataset;
pub mod device;
pub mod guidance;
pub mod inference;
pub mod jobs;
pub mod models;
pub mod settings;
mod utils;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::info;

use capture::{CaptureContext, CaptureSession};
use chat::ChatCoordinator;
use dataset::{DatasetStore, GoalRouter};
use device::FrameSource;
use guidance::GuidanceScanner;
use inference::{InferenceClient, InferenceGateway, Recovered};
use jobs::MediaJobs;
use settings::EngineSettings;

/// Initializes logging (reads `RUST_LOG`; `FIELDLENS_DEBUG=1` lowers the
/// default level to debug). Safe to call more than once.
pub fn init_logging() {
    let debug_mode = std::env::var("FIELDLENS_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let default_level = if debug_mode { "debug" } else { "info" };

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init();
}

/// Long-lived application state shared by the operator and analyst views.
pub struct Engine {
    settings: EngineSettings,
    gateway: InferenceGateway,
    dataset: DatasetStore,
    chat: ChatCoordinator,
    media: MediaJobs,
}

impl Engine {
    pub fn new(settings: EngineSettings, client: Arc<dyn InferenceClient>) -> Self {
        let gateway = InferenceGateway::new(client)
            .with_timeout(settings.inference.timeout_ms.map(Duration::from_millis));

        let goals = settings.goals.seeds.iter().map(|seed| seed.to_goal()).collect();
        let dataset = DatasetStore::new(goals, GoalRouter::from_settings(&settings.goals));
        let chat = ChatCoordinator::new(gateway.clone(), settings.chat.clone());
        let media = MediaJobs::new(gateway.clone(), settings.jobs.poll_interval());

        info!(
            "Engine ready: {} goals tracked, guidance every {}ms",
            dataset.goals().len(),
            settings.guidance.interval_ms
        );

        Self {
            settings,
            gateway,
            dataset,
            chat,
            media,
        }
    }

    /// Opens a capture session on `frames`, starting guidance right away when
    /// configured to. Must be called within a tokio runtime.
    pub fn open_capture(
        &self,
        context: CaptureContext,
        frames: Arc<dyn FrameSource>,
    ) -> Result<CaptureSession> {
        let scanner = if self.settings.guidance.start_on_open {
            let mut scanner = GuidanceScanner::new(
                self.gateway.clone(),
                Arc::clone(&frames),
                &self.settings.guidance,
            );
            scanner.start()?;
            Some(scanner)
        } else {
            None
        };

        Ok(CaptureSession::new(
            context,
            self.gateway.clone(),
            self.dataset.clone(),
            frames,
            scanner,
        ))
    }

    pub async fn generate_report(&self) -> Recovered<String> {
        dataset::generate_report(&self.dataset, &self.gateway).await
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn dataset(&self) -> &DatasetStore {
        &self.dataset
    }

    pub fn chat(&self) -> &ChatCoordinator {
        &self.chat
    }

    pub fn media(&self) -> &MediaJobs {
        &self.media
    }

    /// Cancels background media jobs. Capture sessions stop their own
    /// scanners when dropped.
    pub fn shutdown(&self) {
        self.media.shutdown();
        info!("Engine shut down");
    }
}
