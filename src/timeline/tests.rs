//! Tests for timeline reconstruction
use super::*;
use crate::testing::{batch, milestone_history};

#[test]
fn test_state_tally_counts_new_states() {
    let states = vec![
        BatchState::Succeeded,
        BatchState::Failed,
        BatchState::Succeeded,
        BatchState::Other("paused".to_string()),
    ];

    let tally = state_tally(&states);

    assert_eq!(tally.get("succeeded"), Some(&2));
    assert_eq!(tally.get("failed"), Some(&1));
    assert_eq!(tally.get("paused"), Some(&1));
    assert_eq!(tally.len(), 3);
}

#[test]
fn test_empty_history_batches_counted_but_not_listed() {
    let batches = vec![
        batch("b0", "e", "succeeded", &milestone_history(100.0)),
        batch("b1", "e", "registered", &[]),
    ];

    let result = reconstruct("e", &batches).unwrap();

    assert_eq!(result.batch_states.len(), 2);
    assert_eq!(result.batch_histories.len(), 1);
    assert_eq!(result.history_count(), 1);
    assert_eq!(result.batch_histories[0].node.as_deref(), Some("node-b0"));
    assert_eq!(result.total_time, 10.0);
}

#[test]
fn test_total_time_spans_all_batches() {
    let batches = vec![
        batch("b0", "e", "succeeded", &[("registered", 5.0), ("succeeded", 20.0)]),
        batch("b1", "e", "succeeded", &[("registered", 7.0), ("succeeded", 42.0)]),
        batch("b2", "e", "failed", &[("registered", 6.0), ("failed", 11.0)]),
    ];

    assert_eq!(total_time("e", &batches).unwrap(), 37.0);
}

#[test]
fn test_total_time_without_history_fails() {
    let err = total_time("e", &[]).unwrap_err();
    assert!(matches!(err, Error::EmptyTimeline { ref experiment_id } if experiment_id == "e"));

    let only_empty = vec![batch("b0", "e", "registered", &[])];
    assert!(reconstruct("e", &only_empty).is_err());
}

#[test]
fn test_mount_last_batch_in_order_wins() {
    let mut first = batch("b0", "e", "succeeded", &milestone_history(50.0));
    first.mount = Some(true);
    let mut second = batch("b1", "e", "succeeded", &milestone_history(0.0));
    second.mount = Some(false);
    let third = batch("b2", "e", "succeeded", &milestone_history(10.0));

    // b1 is earlier in time but later in order
    let result = reconstruct("e", &[first.clone(), second, third.clone()]).unwrap();
    assert!(!result.mount);

    let result = reconstruct("e", &[first, third]).unwrap();
    assert!(result.mount);
}

#[test]
fn test_mount_defaults_to_false() {
    let result = reconstruct("e", &[batch("b0", "e", "succeeded", &milestone_history(0.0))]).unwrap();
    assert!(!result.mount);
}

#[test]
fn test_history_order_preserved() {
    let history = [("scheduled", 3.0), ("registered", 1.0), ("processing", 4.0)];
    let result = reconstruct("e", &[batch("b0", "e", "processing", &history)]).unwrap();

    let states: Vec<_> = result.batch_histories[0]
        .history
        .iter()
        .map(|entry| entry.state.as_str())
        .collect();
    assert_eq!(states, vec!["scheduled", "registered", "processing"]);
}

#[test]
fn test_reconstruction_is_repeatable() {
    let batches = vec![
        batch("b0", "e", "succeeded", &milestone_history(0.0)),
        batch("b1", "e", "failed", &[("registered", 1.0), ("failed", 2.0)]),
        batch("b2", "e", "registered", &[]),
    ];
    let before = batches.clone();

    let first = reconstruct("e", &batches).unwrap();
    let second = reconstruct("e", &batches).unwrap();

    assert_eq!(first, second);
    assert_eq!(batches, before);
}

#[test]
fn test_supplied_tally_is_kept() {
    let batches = vec![batch("b0", "e", "succeeded", &milestone_history(0.0))];
    let mut listing = BTreeMap::new();
    listing.insert("processing".to_string(), 1);

    let result = reconstruct_with_states("e", &batches, listing.clone()).unwrap();

    assert_eq!(result.states, listing);
    assert_eq!(result.batch_states, vec![BatchState::Succeeded]);
}

#[test]
fn test_serialized_field_names() {
    let result = reconstruct("e", &[batch("b0", "e", "succeeded", &milestone_history(0.0))]).unwrap();
    let value = serde_json::to_value(&result).unwrap();

    for key in ["experimentId", "states", "batchStates", "batchHistories", "totalTime", "mount"] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["batchStates"][0], "succeeded");
    assert_eq!(value["batchHistories"][0]["history"][0]["state"], "registered");

    let decoded: DetailedResult = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, result);
}

#[test]
fn test_histories_keep_their_batch_state() {
    let batches = vec![
        batch("b0", "e", "registered", &[]),
        batch("b1", "e", "failed", &[("registered", 1.0), ("failed", 2.0)]),
    ];

    let result = reconstruct("e", &batches).unwrap();

    assert_eq!(result.batch_histories[0].state, Some(BatchState::Failed));
}

#[test]
fn test_cached_history_without_state_still_loads() {
    let history: BatchHistory = serde_json::from_value(serde_json::json!({
        "history": [{"state": "registered", "time": 1.0}],
        "node": null,
    }))
    .unwrap();

    assert_eq!(history.state, None);
    assert_eq!(history.history.len(), 1);
}
