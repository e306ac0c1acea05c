use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AnalysisResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ItemStatus {
    Pending,
    Approved,
}

impl ItemStatus {
    /// Approved only when an analysis judged the image quality sufficient.
    pub fn for_analysis(analysis: Option<&AnalysisResult>) -> Self {
        match analysis {
            Some(result) if result.is_quality_sufficient => ItemStatus::Approved,
            _ => ItemStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Approved => "approved",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    pub component_class: String,
    pub location: String,
}

/// One saved capture. Image payloads are kept out of the JSON form; the
/// analyst view fetches them separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedItem {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub image: Vec<u8>,
    #[serde(skip)]
    pub overlay: Option<Vec<u8>>,
    pub analysis: Option<AnalysisResult>,
    pub status: ItemStatus,
    pub metadata: ItemMetadata,
}

impl CapturedItem {
    /// Builds an item from a finished capture. The item is approved only when
    /// the analysis judged the image quality sufficient.
    pub fn new(
        image: Vec<u8>,
        overlay: Option<Vec<u8>>,
        analysis: Option<AnalysisResult>,
        metadata: ItemMetadata,
    ) -> Self {
        let status = ItemStatus::for_analysis(analysis.as_ref());

        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            image,
            overlay,
            analysis,
            status,
            metadata,
        }
    }

    pub fn defect_type(&self) -> Option<&str> {
        self.analysis.as_ref().map(|a| a.defect_type.as_str())
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }
}
