mod common;

use common::{analysis, dataset, goal_count};
use fieldlens::{
    dataset::{DatasetEvent, DatasetStore, GoalRouter},
    models::{CapturedItem, ItemMetadata, ItemStatus, Severity},
    settings::{GoalRoute, GENERAL_GOAL_ID, RUST_GOAL_ID},
};

fn saved(defect: &str, sufficient: bool) -> CapturedItem {
    CapturedItem::new(
        vec![0xFF, 0xD8],
        None,
        Some(analysis(defect, sufficient)),
        ItemMetadata {
            component_class: "Valve".into(),
            location: "Line 3".into(),
        },
    )
}

#[test]
fn rust_defects_credit_the_rust_goal_only() {
    let store = dataset();
    let before = store.goals();

    store.commit(saved("Surface Rust", true));

    assert_eq!(goal_count(&store, RUST_GOAL_ID), 1);
    assert_eq!(goal_count(&store, GENERAL_GOAL_ID), 0);
    for (after, before) in store.goals().iter().zip(&before) {
        if after.id != RUST_GOAL_ID {
            assert_eq!(after, before);
        }
    }
}

#[test]
fn other_defects_credit_the_general_goal() {
    let store = dataset();

    store.commit(saved("Crack", true));
    store.commit(saved("None", true));
    store.commit(saved("Hairline crack near RUSTED bolt", false));

    assert_eq!(goal_count(&store, GENERAL_GOAL_ID), 2);
    assert_eq!(goal_count(&store, RUST_GOAL_ID), 1);
}

#[test]
fn items_saved_without_analysis_go_to_the_default_goal() {
    let store = dataset();

    store.commit(CapturedItem::new(vec![1], None, None, ItemMetadata::default()));

    assert_eq!(store.items()[0].status, ItemStatus::Pending);
    assert_eq!(goal_count(&store, GENERAL_GOAL_ID), 1);
}

#[test]
fn items_marked_approved_without_analysis_are_committed_as_pending() {
    let store = dataset();
    let mut item = CapturedItem::new(vec![1], None, None, ItemMetadata::default());
    item.status = ItemStatus::Approved;

    store.commit(item);

    let committed = &store.items()[0];
    assert_eq!(committed.status, ItemStatus::Pending);
    assert!(committed.analysis.is_none());
    let aggregate = store.aggregate();
    assert_eq!(aggregate.approved, 0);
    assert_eq!(aggregate.quality_pct, 0);
}

#[test]
fn custom_routes_are_matched_case_insensitively_in_order() {
    let router = GoalRouter::new(
        vec![
            GoalRoute {
                keyword: "Corrosion".into(),
                goal_id: "goal-corrosion".into(),
            },
            GoalRoute {
                keyword: "rust".into(),
                goal_id: RUST_GOAL_ID.into(),
            },
        ],
        GENERAL_GOAL_ID,
    );

    assert_eq!(router.route_defect("Rust-driven CORROSION"), "goal-corrosion");
    assert_eq!(router.route_defect("flaking rust"), RUST_GOAL_ID);
    assert_eq!(router.route_defect("Dent"), GENERAL_GOAL_ID);
}

#[test]
fn aggregate_reflects_every_commit() {
    let store = dataset();
    store.commit(saved("Crack", true));
    store.commit(saved("Crack", false));
    store.commit(saved("Surface Rust", true));

    let aggregate = store.aggregate();

    assert_eq!(aggregate.total, 3);
    assert_eq!(aggregate.approved, 2);
    assert_eq!(aggregate.pending, 1);
    assert_eq!(aggregate.quality_pct, 67);
    assert_eq!(aggregate.defect_histogram.get("Crack"), Some(&2));
    assert_eq!(aggregate.defect_histogram.get("Surface Rust"), Some(&1));
    assert_eq!(aggregate.severity_histogram.get(&Severity::Medium), Some(&3));

    let goal_total: u32 = store.goals().iter().map(|goal| goal.current_count).sum();
    assert_eq!(goal_total as usize, aggregate.total);
}

#[test]
fn empty_dataset_has_zero_quality() {
    let store = DatasetStore::new(Vec::new(), GoalRouter::default());
    let aggregate = store.aggregate();
    assert_eq!(aggregate.total, 0);
    assert_eq!(aggregate.quality_pct, 0);
    assert!(aggregate.defect_histogram.is_empty());
}

#[tokio::test]
async fn subscribers_hear_about_commits_from_cloned_handles() {
    let store = dataset();
    let mut events = store.subscribe();
    let writer = store.clone();

    let item = saved("Surface Rust", true);
    let item_id = item.id.clone();
    tokio::spawn(async move { writer.commit(item) })
        .await
        .unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        DatasetEvent::ItemCommitted {
            item_id,
            goal_id: Some(RUST_GOAL_ID.into()),
        }
    );
    assert_eq!(store.len(), 1);
}
