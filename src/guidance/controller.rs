use std::sync::{atomic::AtomicU64, Arc};

use anyhow::{bail, Result};
use log::info;
use tokio::{sync::watch, task::JoinHandle, time::Duration};
use tokio_util::sync::CancellationToken;

use crate::{device::FrameSource, inference::InferenceGateway, settings::GuidanceSettings};

use super::{
    loop_worker::{scan_loop, spawn_scan, ScanContext},
    publisher::{HintPublisher, HintSet},
};

/// Periodically samples the viewfinder and publishes framing hints.
pub struct GuidanceScanner {
    ctx: ScanContext,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl GuidanceScanner {
    pub fn new(
        gateway: InferenceGateway,
        frames: Arc<dyn FrameSource>,
        settings: &GuidanceSettings,
    ) -> Self {
        Self {
            ctx: ScanContext {
                gateway: gateway.with_max_hints(settings.max_hints),
                frames,
                publisher: HintPublisher::new(settings.ordering),
                frame_max_width: settings.frame_max_width,
                jpeg_quality: settings.jpeg_quality,
                next_seq: Arc::new(AtomicU64::new(0)),
                generation: 0,
            },
            interval: settings.interval(),
            handle: None,
            cancel_token: None,
        }
    }

    /// Issues one scan right away, then one per interval until [`stop`].
    ///
    /// [`stop`]: GuidanceScanner::stop
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            bail!("guidance already active");
        }

        self.ctx.generation = self.ctx.publisher.open();
        spawn_scan(&self.ctx);

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(scan_loop(
            self.ctx.clone(),
            self.interval,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("Guidance started ({}ms interval)", self.interval.as_millis());
        Ok(())
    }

    /// Stops scheduling scans and suppresses results of scans still in flight,
    /// including after a later [`start`](GuidanceScanner::start). Safe to call
    /// repeatedly.
    pub fn stop(&mut self) {
        self.ctx.publisher.close();

        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Guidance stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn hints(&self) -> watch::Receiver<HintSet> {
        self.ctx.publisher.subscribe()
    }

    pub fn current_hints(&self) -> HintSet {
        self.ctx.publisher.current()
    }
}

impl Drop for GuidanceScanner {
    fn drop(&mut self) {
        self.stop();
    }
}
