use std::sync::Arc;

use anyhow::anyhow;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    dataset::DatasetStore,
    device::FrameSource,
    guidance::{GuidanceScanner, HintSet},
    inference::InferenceGateway,
    models::{AnalysisResult, CapturedItem, ItemMetadata},
};

use super::state::{CaptureSnapshot, CaptureState};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot {action} while the session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: CaptureState,
    },

    #[error("device capture failed: {0:#}")]
    Device(anyhow::Error),
}

/// Where and what the operator is inspecting; sent along with the image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureContext {
    pub component_class: String,
    pub location: String,
    pub note: Option<String>,
}

impl CaptureContext {
    pub fn new(component_class: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            component_class: component_class.into(),
            location: location.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn describe(&self) -> String {
        let mut text = format!(
            "Component: {}. Location: {}.",
            self.component_class, self.location
        );
        if let Some(note) = self.note.as_deref().filter(|n| !n.trim().is_empty()) {
            text.push_str(&format!(" Operator note: {}.", note.trim()));
        }
        text
    }

    fn metadata(&self) -> ItemMetadata {
        ItemMetadata {
            component_class: self.component_class.clone(),
            location: self.location.clone(),
        }
    }
}

pub fn highlight_prompt(defect_type: &str) -> String {
    format!(
        "Highlight the {defect_type} in this image with a bright outline and a short label. \
         Leave the rest of the image unchanged."
    )
}

/// One pass through guidance, capture, analysis and save/discard.
///
/// Operations take `&mut self`, so analysis and the overlay request that may
/// follow it run strictly in sequence and at most once per session.
pub struct CaptureSession {
    id: String,
    context: CaptureContext,
    state: CaptureState,
    gateway: InferenceGateway,
    dataset: DatasetStore,
    frames: Arc<dyn FrameSource>,
    scanner: Option<GuidanceScanner>,
    image: Option<Arc<Vec<u8>>>,
    analysis: Option<AnalysisResult>,
    overlay: Option<Vec<u8>>,
    overlay_requests: u32,
    snapshot_tx: watch::Sender<CaptureSnapshot>,
}

impl CaptureSession {
    /// Opens a session in `Live`. When a scanner is supplied it is owned by
    /// the session and stopped on capture or disposal.
    pub fn new(
        context: CaptureContext,
        gateway: InferenceGateway,
        dataset: DatasetStore,
        frames: Arc<dyn FrameSource>,
        scanner: Option<GuidanceScanner>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(CaptureSnapshot::default());
        let id = Uuid::new_v4().to_string();
        info!(
            "Capture session {id} opened for {} at {}",
            context.component_class, context.location
        );

        Self {
            id,
            context,
            state: CaptureState::Live,
            gateway,
            dataset,
            frames,
            scanner,
            image: None,
            analysis: None,
            overlay: None,
            overlay_requests: 0,
            snapshot_tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn context(&self) -> &CaptureContext {
        &self.context
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref().map(|bytes| bytes.as_slice())
    }

    pub fn overlay(&self) -> Option<&[u8]> {
        self.overlay.as_deref()
    }

    pub fn overlay_requests(&self) -> u32 {
        self.overlay_requests
    }

    pub fn is_guidance_active(&self) -> bool {
        self.scanner.as_ref().is_some_and(|s| s.is_active())
    }

    pub fn hints(&self) -> Option<watch::Receiver<HintSet>> {
        self.scanner.as_ref().map(|s| s.hints())
    }

    pub fn watch(&self) -> watch::Receiver<CaptureSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Freezes a still from the camera. Guidance stops only once the still is
    /// in hand; a device failure leaves the session live.
    pub async fn capture(&mut self) -> Result<(), CaptureError> {
        self.expect_state("capture", CaptureState::Live)?;

        let frames = Arc::clone(&self.frames);
        let still = tokio::task::spawn_blocking(move || frames.capture_still())
            .await
            .map_err(|err| CaptureError::Device(anyhow!("capture worker join failed: {err}")))?
            .map_err(CaptureError::Device)?;

        self.stop_guidance();
        info!("Session {} captured {} bytes", self.id, still.len());
        self.image = Some(Arc::new(still));
        self.transition(CaptureState::Captured, false);
        Ok(())
    }

    /// Runs analysis and, when the result calls for it, the overlay request.
    /// Inference failures never fail this call; they degrade the result.
    pub async fn analyze(&mut self) -> Result<&AnalysisResult, CaptureError> {
        self.expect_state("analyze", CaptureState::Captured)?;
        let image = self
            .image
            .clone()
            .ok_or(CaptureError::InvalidTransition {
                action: "analyze",
                state: self.state,
            })?;

        self.transition(CaptureState::Analyzing, false);
        let recovered = self.gateway.analyze(&image, &self.context.describe()).await;
        if recovered.is_fallback() {
            warn!("Session {} analysis degraded to fallback result", self.id);
        }
        let analysis = recovered.into_inner();
        let wants_overlay = analysis.wants_overlay();
        let defect_type = analysis.defect_type.clone();
        self.analysis = Some(analysis);
        self.transition(CaptureState::Analyzed, wants_overlay);

        if wants_overlay {
            self.request_overlay(&image, &defect_type).await;
        }

        self.analysis
            .as_ref()
            .ok_or(CaptureError::InvalidTransition {
                action: "analyze",
                state: self.state,
            })
    }

    /// Commits the analysed capture to the dataset and closes the session.
    pub fn save(&mut self) -> Result<CapturedItem, CaptureError> {
        self.expect_state("save", CaptureState::Analyzed)?;
        let missing = CaptureError::InvalidTransition {
            action: "save",
            state: self.state,
        };
        let Some(analysis) = self.analysis.clone() else {
            return Err(missing);
        };
        let Some(image) = self.image.take() else {
            return Err(missing);
        };

        let image = Arc::try_unwrap(image).unwrap_or_else(|shared| shared.as_ref().clone());
        let item = CapturedItem::new(
            image,
            self.overlay.take(),
            Some(analysis),
            self.context.metadata(),
        );
        self.dataset.commit(item.clone());
        info!(
            "Session {} saved item {} as {}",
            self.id,
            item.id,
            item.status.as_str()
        );

        self.dispose(CaptureState::Saved);
        Ok(item)
    }

    /// Closes the session without committing anything.
    pub fn discard(&mut self) -> Result<(), CaptureError> {
        if self.state.is_terminal() {
            return Err(CaptureError::InvalidTransition {
                action: "discard",
                state: self.state,
            });
        }
        info!("Session {} discarded in state {}", self.id, self.state);
        self.dispose(CaptureState::Discarded);
        Ok(())
    }

    async fn request_overlay(&mut self, image: &[u8], defect_type: &str) {
        self.overlay_requests += 1;
        let overlay = self
            .gateway
            .augment(image, &highlight_prompt(defect_type))
            .await
            .into_inner();
        if overlay.is_none() {
            warn!("Session {} continues without an overlay", self.id);
        }
        self.overlay = overlay;
        self.publish(false);
    }

    fn expect_state(&self, action: &'static str, expected: CaptureState) -> Result<(), CaptureError> {
        if self.state != expected {
            return Err(CaptureError::InvalidTransition {
                action,
                state: self.state,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: CaptureState, augmenting: bool) {
        self.state = next;
        self.publish(augmenting);
    }

    fn publish(&self, augmenting: bool) {
        self.snapshot_tx.send_replace(CaptureSnapshot {
            state: self.state,
            augmenting,
            has_overlay: self.overlay.is_some(),
        });
    }

    fn stop_guidance(&mut self) {
        if let Some(mut scanner) = self.scanner.take() {
            scanner.stop();
        }
    }

    fn dispose(&mut self, terminal: CaptureState) {
        self.stop_guidance();
        self.image = None;
        self.overlay = None;
        self.transition(terminal, false);
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_guidance();
    }
}
