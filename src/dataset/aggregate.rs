use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{CapturedItem, ItemStatus, Severity};

/// Histogram key for items saved without an analysis.
pub const UNANALYZED: &str = "Unanalyzed";

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DatasetAggregate {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    /// Approved share of all items in whole percent; 0 for an empty dataset.
    pub quality_pct: u32,
    pub defect_histogram: BTreeMap<String, usize>,
    pub severity_histogram: BTreeMap<Severity, usize>,
}

impl DatasetAggregate {
    pub fn compute(items: &[CapturedItem]) -> Self {
        let mut aggregate = DatasetAggregate {
            total: items.len(),
            ..Default::default()
        };

        for item in items {
            match item.status {
                ItemStatus::Approved => aggregate.approved += 1,
                ItemStatus::Pending => aggregate.pending += 1,
            }

            let defect = item.defect_type().unwrap_or(UNANALYZED).to_string();
            *aggregate.defect_histogram.entry(defect).or_default() += 1;

            if let Some(analysis) = &item.analysis {
                *aggregate
                    .severity_histogram
                    .entry(analysis.severity)
                    .or_default() += 1;
            }
        }

        aggregate.quality_pct = quality_pct(aggregate.approved, aggregate.total);
        aggregate
    }
}

fn quality_pct(approved: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (approved as f64 / total as f64 * 100.0).round() as u32
}
