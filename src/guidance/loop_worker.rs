use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use anyhow::{anyhow, Context};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    device::FrameSource,
    inference::{InferenceGateway, GUIDANCE_UNAVAILABLE},
};

use super::{frame::encode_guidance_frame, publisher::HintPublisher};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Everything a single scan needs; cloned into each scan task.
#[derive(Clone)]
pub(crate) struct ScanContext {
    pub(crate) gateway: InferenceGateway,
    pub(crate) frames: Arc<dyn FrameSource>,
    pub(crate) publisher: HintPublisher,
    pub(crate) frame_max_width: u32,
    pub(crate) jpeg_quality: u8,
    pub(crate) next_seq: Arc<AtomicU64>,
    /// Publisher generation this activation was opened under.
    pub(crate) generation: u64,
}

/// Fires a scan every `interval` until cancelled. The scan issued by
/// `start()` itself covers t=0, so the first tick here is one interval out.
pub(crate) async fn scan_loop(ctx: ScanContext, interval: Duration, cancel_token: CancellationToken) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("guidance loop shutting down");
                break;
            }
            _ = ticker.tick() => spawn_scan(&ctx),
        }
    }
}

/// Scans are deliberately not awaited here: a slow response must not delay
/// the next tick, so overlapping scans race to publish.
pub(crate) fn spawn_scan(ctx: &ScanContext) {
    let seq = ctx.next_seq.fetch_add(1, Ordering::SeqCst);
    tokio::spawn(run_scan(ctx.clone(), seq));
}

async fn run_scan(ctx: ScanContext, seq: u64) {
    let started = Instant::now();
    let frames = Arc::clone(&ctx.frames);
    let (max_width, quality) = (ctx.frame_max_width, ctx.jpeg_quality);

    let encoded = tokio::task::spawn_blocking(move || {
        let frame = frames.sample_frame().context("viewfinder frame unavailable")?;
        encode_guidance_frame(&frame, max_width, quality)
    })
    .await
    .map_err(|err| anyhow!("frame worker join failed: {err}"))
    .and_then(|result| result);

    let (hints, degraded) = match encoded {
        Ok(jpeg) => {
            let recovered = ctx.gateway.guidance(&jpeg).await;
            let degraded = recovered.is_fallback();
            (recovered.into_inner(), degraded)
        }
        Err(err) => {
            log_warn!("guidance scan {seq} could not sample a frame: {err:#}");
            (vec![GUIDANCE_UNAVAILABLE.to_string()], true)
        }
    };

    let hint_count = hints.len();
    if ctx.publisher.publish(ctx.generation, seq, hints, degraded) {
        log_debug!(
            "guidance scan {seq} published {hint_count} hints in {}ms",
            started.elapsed().as_millis()
        );
    } else {
        log_debug!("guidance scan {seq} result discarded");
    }
}
