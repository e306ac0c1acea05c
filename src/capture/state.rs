use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CaptureState {
    Live,
    Captured,
    Analyzing,
    Analyzed,
    Saved,
    Discarded,
}

impl Default for CaptureState {
    fn default() -> Self {
        CaptureState::Live
    }
}

impl CaptureState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureState::Saved | CaptureState::Discarded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureState::Live => "live",
            CaptureState::Captured => "captured",
            CaptureState::Analyzing => "analyzing",
            CaptureState::Analyzed => "analyzed",
            CaptureState::Saved => "saved",
            CaptureState::Discarded => "discarded",
        }
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What observers of a session see after every transition.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSnapshot {
    pub state: CaptureState,
    pub augmenting: bool,
    pub has_overlay: bool,
}
