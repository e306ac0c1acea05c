use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    Active,
    AtRisk,
    Complete,
}

impl Default for GoalStatus {
    fn default() -> Self {
        GoalStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGoal {
    pub id: String,
    pub title: String,
    pub target_count: u32,
    pub current_count: u32,
    pub deadline: DateTime<Utc>,
    pub status: GoalStatus,
}

impl ProjectGoal {
    /// Credits one collected sample. Returns true when this increment completed
    /// the goal.
    pub(crate) fn record_sample(&mut self) -> bool {
        self.current_count = self.current_count.saturating_add(1);
        if self.status != GoalStatus::Complete && self.current_count >= self.target_count {
            self.status = GoalStatus::Complete;
            return true;
        }
        false
    }

    pub fn progress_pct(&self) -> u32 {
        if self.target_count == 0 {
            return 100;
        }
        let pct = (self.current_count as f64 / self.target_count as f64 * 100.0).round();
        pct.min(100.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(target_count: u32) -> ProjectGoal {
        ProjectGoal {
            id: "goal-test".into(),
            title: "test".into(),
            target_count,
            current_count: 0,
            deadline: Utc::now(),
            status: GoalStatus::Active,
        }
    }

    #[test]
    fn progress_rounds_and_caps_at_full() {
        let mut goal = goal(3);
        assert_eq!(goal.progress_pct(), 0);

        assert!(!goal.record_sample());
        assert_eq!(goal.progress_pct(), 33);
        goal.record_sample();
        assert_eq!(goal.progress_pct(), 67);
        assert!(goal.record_sample());
        assert_eq!(goal.status, GoalStatus::Complete);

        assert!(!goal.record_sample());
        assert_eq!(goal.current_count, 4);
        assert_eq!(goal.progress_pct(), 100);
    }

    #[test]
    fn goal_without_target_reads_as_complete() {
        assert_eq!(goal(0).progress_pct(), 100);
    }
}
