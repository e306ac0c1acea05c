use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

use crate::settings::HintOrdering;

/// Hints currently shown on the viewfinder HUD.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HintSet {
    pub hints: Vec<String>,
    /// Sequence number of the scan that produced these hints.
    pub scan_seq: u64,
    /// Bumped once per publish.
    pub revision: u64,
    /// True when the hints are the sentinel shown after a failed scan.
    pub degraded: bool,
}

struct GateState {
    open: bool,
    /// Bumped on every open and close; scans carry the value they started
    /// under and may only publish while it is still current.
    generation: u64,
    latest_published_seq: Option<u64>,
    revision: u64,
}

/// Publishes hint sets behind a gate. Closing the gate takes the same lock as
/// publishing, so once [`HintPublisher::close`] returns no late scan can
/// overwrite the HUD, not even after the gate is opened again.
#[derive(Clone)]
pub(crate) struct HintPublisher {
    gate: Arc<Mutex<GateState>>,
    tx: Arc<watch::Sender<HintSet>>,
    ordering: HintOrdering,
}

impl HintPublisher {
    pub(crate) fn new(ordering: HintOrdering) -> Self {
        let (tx, _) = watch::channel(HintSet::default());
        Self {
            gate: Arc::new(Mutex::new(GateState {
                open: false,
                generation: 0,
                latest_published_seq: None,
                revision: 0,
            })),
            tx: Arc::new(tx),
            ordering,
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<HintSet> {
        self.tx.subscribe()
    }

    pub(crate) fn current(&self) -> HintSet {
        self.tx.borrow().clone()
    }

    /// Opens the gate for a new activation and returns its generation.
    pub(crate) fn open(&self) -> u64 {
        let mut gate = self.lock();
        gate.open = true;
        gate.generation += 1;
        gate.latest_published_seq = None;
        gate.generation
    }

    pub(crate) fn close(&self) {
        let mut gate = self.lock();
        if gate.open {
            gate.open = false;
            gate.generation += 1;
        }
    }

    /// Returns false when the hints were dropped: gate closed, scan started
    /// under an earlier activation, or a newer scan already published under
    /// [`HintOrdering::LatestScan`].
    pub(crate) fn publish(
        &self,
        generation: u64,
        scan_seq: u64,
        hints: Vec<String>,
        degraded: bool,
    ) -> bool {
        let mut gate = self.lock();
        if !gate.open || gate.generation != generation {
            return false;
        }
        if self.ordering == HintOrdering::LatestScan
            && gate.latest_published_seq.is_some_and(|latest| latest > scan_seq)
        {
            return false;
        }

        gate.latest_published_seq = Some(scan_seq);
        gate.revision += 1;
        self.tx.send_replace(HintSet {
            hints,
            scan_seq,
            revision: gate.revision,
            degraded,
        });
        true
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
