use serde::{Deserialize, Serialize};

/// Defect type reported when the inspected component shows no defect.
pub const NO_DEFECT: &str = "None";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Low
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub defect_type: String,
    pub severity: Severity,
    /// Model confidence in percent, always within `0.0..=100.0`.
    pub confidence: f32,
    pub instructions: String,
    pub is_quality_sufficient: bool,
    #[serde(default)]
    pub missing_angles: Vec<String>,
}

impl AnalysisResult {
    /// Result used when the analysis call fails. It never qualifies for
    /// augmentation or approval.
    pub fn fallback() -> Self {
        Self {
            defect_type: "Unknown".into(),
            severity: Severity::Low,
            confidence: 0.0,
            instructions: "Automated analysis is unavailable. Retake the image and try again."
                .into(),
            is_quality_sufficient: false,
            missing_angles: Vec::new(),
        }
    }

    pub fn has_defect(&self) -> bool {
        self.defect_type != NO_DEFECT
    }

    /// Whether reaching `Analyzed` with this result triggers an overlay request.
    pub fn wants_overlay(&self) -> bool {
        self.has_defect() && self.is_quality_sufficient
    }

    pub(crate) fn clamp_confidence(&mut self) {
        self.confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 100.0)
        } else {
            0.0
        };
    }
}
