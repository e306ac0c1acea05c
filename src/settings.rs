use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::models::{GoalStatus, ProjectGoal};

pub const RUST_GOAL_ID: &str = "goal-rust";
pub const GENERAL_GOAL_ID: &str = "goal-general";

/// How overlapping guidance scans resolve when their responses arrive out of
/// order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HintOrdering {
    /// Whichever response arrives last is shown, even if it belongs to an
    /// older frame.
    Arrival,
    /// Responses for scans older than the last published one are dropped.
    LatestScan,
}

impl Default for HintOrdering {
    fn default() -> Self {
        HintOrdering::Arrival
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GuidanceSettings {
    pub interval_ms: u64,
    /// Sampled frames wider than this are scaled down before upload.
    pub frame_max_width: u32,
    pub jpeg_quality: u8,
    /// Hints shown per scan; values above 3 are treated as 3.
    pub max_hints: usize,
    pub ordering: HintOrdering,
    /// Start the scanner as soon as a capture session opens.
    pub start_on_open: bool,
}

impl Default for GuidanceSettings {
    fn default() -> Self {
        Self {
            interval_ms: 3_000,
            frame_max_width: 480,
            jpeg_quality: 60,
            max_hints: 3,
            ordering: HintOrdering::Arrival,
            start_on_open: true,
        }
    }
}

impl GuidanceSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSettings {
    pub poll_interval_ms: u64,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
        }
    }
}

impl JobSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InferenceSettings {
    /// Upper bound for best-effort calls; `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            timeout_ms: Some(30_000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    pub operator_role: String,
    pub assistant_role: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            operator_role: "Field Technician".into(),
            assistant_role: "Central".into(),
        }
    }
}

/// Routes a defect type to a goal when `keyword` occurs in it, ignoring case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GoalRoute {
    pub keyword: String,
    pub goal_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalSeed {
    pub id: String,
    pub title: String,
    pub target_count: u32,
    #[serde(default)]
    pub current_count: u32,
    /// Deadline relative to engine start-up.
    pub deadline_days: i64,
    #[serde(default)]
    pub status: GoalStatus,
}

impl GoalSeed {
    pub fn to_goal(&self) -> ProjectGoal {
        let mut status = self.status;
        if self.current_count >= self.target_count {
            status = GoalStatus::Complete;
        }
        ProjectGoal {
            id: self.id.clone(),
            title: self.title.clone(),
            target_count: self.target_count,
            current_count: self.current_count,
            deadline: Utc::now() + ChronoDuration::days(self.deadline_days),
            status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalSettings {
    pub routes: Vec<GoalRoute>,
    pub default_goal_id: String,
    pub seeds: Vec<GoalSeed>,
}

impl Default for GoalSettings {
    fn default() -> Self {
        Self {
            routes: vec![GoalRoute {
                keyword: "rust".into(),
                goal_id: RUST_GOAL_ID.into(),
            }],
            default_goal_id: GENERAL_GOAL_ID.into(),
            seeds: vec![
                GoalSeed {
                    id: RUST_GOAL_ID.into(),
                    title: "Corrosion dataset: surface rust samples".into(),
                    target_count: 500,
                    current_count: 0,
                    deadline_days: 30,
                    status: GoalStatus::Active,
                },
                GoalSeed {
                    id: GENERAL_GOAL_ID.into(),
                    title: "General defect coverage".into(),
                    target_count: 1_000,
                    current_count: 0,
                    deadline_days: 60,
                    status: GoalStatus::Active,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    pub guidance: GuidanceSettings,
    pub jobs: JobSettings,
    pub inference: InferenceSettings,
    pub chat: ChatSettings,
    pub goals: GoalSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<EngineSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring malformed settings in {}: {err}; using defaults",
                    path.display()
                );
                EngineSettings::default()
            })
        } else {
            EngineSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> EngineSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies `apply` to a copy and persists it; the in-memory settings only
    /// change once the file is written.
    pub fn update(&self, apply: impl FnOnce(&mut EngineSettings)) -> Result<EngineSettings> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        apply(&mut next);
        self.persist(&next)?;
        *guard = next.clone();
        Ok(next)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: EngineSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data;
        Ok(())
    }

    fn persist(&self, data: &EngineSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
