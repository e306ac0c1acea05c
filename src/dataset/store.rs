use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{CapturedItem, ItemStatus, ProjectGoal};

use super::{aggregate::DatasetAggregate, router::GoalRouter};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetEvent {
    ItemCommitted {
        item_id: String,
        goal_id: Option<String>,
    },
    GoalCompleted {
        goal_id: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSnapshot {
    pub items: Vec<CapturedItem>,
    pub goals: Vec<ProjectGoal>,
    pub aggregate: DatasetAggregate,
}

struct DatasetState {
    items: Vec<CapturedItem>,
    goals: Vec<ProjectGoal>,
}

/// Shared, append-only collection of saved captures and the goals they feed.
///
/// Every mutation goes through [`DatasetStore::commit`], which appends the
/// item and credits its goal under one lock, so readers never observe an item
/// without its goal increment.
#[derive(Clone)]
pub struct DatasetStore {
    inner: Arc<Mutex<DatasetState>>,
    router: Arc<GoalRouter>,
    events: broadcast::Sender<DatasetEvent>,
}

impl DatasetStore {
    pub fn new(goals: Vec<ProjectGoal>, router: GoalRouter) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(DatasetState {
                items: Vec::new(),
                goals,
            })),
            router: Arc::new(router),
            events,
        }
    }

    /// Appends `item` and credits the goal it routes to. The item's status is
    /// re-derived from its analysis, so an approved item always carries a
    /// quality-sufficient analysis.
    pub fn commit(&self, mut item: CapturedItem) {
        let status = ItemStatus::for_analysis(item.analysis.as_ref());
        if item.status != status {
            log_warn!(
                "Item {} submitted as {}, committing as {}",
                item.id,
                item.status.as_str(),
                status.as_str()
            );
            item.status = status;
        }

        let goal_id = self.router.route(&item).to_string();
        let item_id = item.id.clone();

        let (credited, completed) = {
            let mut state = self.lock();
            let mut credited = None;
            let mut completed = false;
            if let Some(goal) = state.goals.iter_mut().find(|goal| goal.id == goal_id) {
                completed = goal.record_sample();
                credited = Some(goal.id.clone());
            }
            state.items.push(item);
            (credited, completed)
        };

        match &credited {
            Some(goal_id) => log_info!("Committed item {item_id} toward goal {goal_id}"),
            None => log_warn!("Committed item {item_id}; routed goal {goal_id} is not tracked"),
        }

        // No subscribers is fine; the analyst view may not be open.
        let _ = self.events.send(DatasetEvent::ItemCommitted {
            item_id,
            goal_id: credited.clone(),
        });
        if completed {
            if let Some(goal_id) = credited {
                log_info!("Goal {goal_id} reached its target");
                let _ = self.events.send(DatasetEvent::GoalCompleted { goal_id });
            }
        }
    }

    pub fn items(&self) -> Vec<CapturedItem> {
        self.lock().items.clone()
    }

    pub fn goals(&self) -> Vec<ProjectGoal> {
        self.lock().goals.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn aggregate(&self) -> DatasetAggregate {
        DatasetAggregate::compute(&self.lock().items)
    }

    pub fn snapshot(&self) -> DatasetSnapshot {
        let state = self.lock();
        DatasetSnapshot {
            items: state.items.clone(),
            goals: state.goals.clone(),
            aggregate: DatasetAggregate::compute(&state.items),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DatasetEvent> {
        self.events.subscribe()
    }

    // Commit never panics while holding the lock, but a poisoned guard still
    // holds consistent data, so keep serving it.
    fn lock(&self) -> MutexGuard<'_, DatasetState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
