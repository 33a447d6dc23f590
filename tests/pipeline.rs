//! End-to-end collection against a local HTTP agency

mod common;

use batchtrace::agency::{AgencyClient, Credentials};
use batchtrace::collect::{run, run_with, Collector};
use batchtrace::config::Config;
use batchtrace::fetch::SilentProgress;
use common::{succeeded_batch, MockAgency, PASSWORD, USERNAME};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;

fn config_for(url: &str, root: &Path, experiments: &[&str]) -> Config {
    let experiments_dir = root.join("executed_experiments");
    fs::create_dir_all(&experiments_dir).unwrap();
    for experiment_id in experiments {
        fs::write(experiments_dir.join(format!("{experiment_id}.json")), "{}").unwrap();
    }

    let mut config = Config {
        cache_dir: root.join("cache"),
        results_dir: root.join("results"),
        experiments_dir,
        ..Config::default()
    };
    config.agency.url = url.to_string();
    config.agency.username = USERNAME.to_string();
    config.agency.password = PASSWORD.to_string();
    config
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_run_writes_tables_and_caches() {
    let temp_dir = TempDir::new().unwrap();
    let (url, agency) = MockAgency::new(vec![
        succeeded_batch("a0", "exp-a", 0.0),
        succeeded_batch("a1", "exp-a", 60.0),
        succeeded_batch("b0", "exp-b", 30.0),
    ])
    .serve()
    .await;
    let config = config_for(&url, temp_dir.path(), &["exp-a", "exp-b"]);

    let results = run(&config).await.unwrap();

    assert_eq!(results["exp-a"].total_time, 70.0);
    assert!(results["exp-a"].mount);
    assert_eq!(agency.detail_calls.load(Ordering::SeqCst), 3);

    let cache_dir = &config.cache_dir;
    assert!(cache_dir.join("exp-a.json").is_file());
    assert!(cache_dir.join("result_exp-b.json").is_file());

    let timestamps = read(&config.results_dir.join("processing_timestamps.csv"));
    assert_eq!(
        timestamps.lines().next(),
        Some(",experiment_id,timestamp_registered,timestamp_scheduled,timestamp_processing,timestamp_succeeded")
    );
    assert_eq!(timestamps.lines().nth(2), Some("1,exp-a,60,62,65,70"));

    let durations = read(&config.results_dir.join("processing_durations.csv"));
    assert_eq!(durations.lines().nth(1), Some("0,exp-a,3,5,succeeded"));

    let success = read(&config.results_dir.join("success_rate.csv"));
    assert_eq!(
        success,
        "experimentId,state,count\nexp-a,succeeded,2\nexp-b,succeeded,1\n"
    );

    assert!(config.results_dir.join("state_occupancy.csv").is_file());
    assert!(config.results_dir.join("state_transitions.csv").is_file());
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    let (url, agency) = MockAgency::new(vec![succeeded_batch("a0", "exp-a", 0.0)])
        .serve()
        .await;
    let config = config_for(&url, temp_dir.path(), &["exp-a"]);

    let first = run(&config).await.unwrap();
    let second = run(&config).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(agency.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(agency.detail_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_fetch_names_the_experiment() {
    let temp_dir = TempDir::new().unwrap();
    let (url, _agency) = MockAgency::new(vec![
        succeeded_batch("a0", "exp-a", 0.0),
        succeeded_batch("a1", "exp-a", 1.0),
    ])
    .with_broken("a1")
    .serve()
    .await;
    let config = config_for(&url, temp_dir.path(), &["exp-a"]);

    let err = run(&config).await.unwrap_err();

    assert_eq!(err.experiment_id(), Some("exp-a"));
    assert!(!config.cache_dir.join("exp-a.json").exists());
    assert!(!config.results_dir.join("processing_timestamps.csv").exists());
}

#[tokio::test]
async fn test_failed_batch_stops_timestamp_table() {
    let temp_dir = TempDir::new().unwrap();
    let (url, _agency) = MockAgency::new(vec![
        succeeded_batch("a0", "exp-a", 0.0),
        json!({
            "_id": "a1",
            "experimentId": "exp-a",
            "state": "failed",
            "history": [
                {"state": "registered", "time": 1.0},
                {"state": "failed", "time": 4.0},
            ],
        }),
    ])
    .serve()
    .await;
    let config = config_for(&url, temp_dir.path(), &["exp-a"]);
    let client = AgencyClient::new(&url, Credentials::new(USERNAME, PASSWORD)).unwrap();
    let collector =
        Collector::new(Arc::new(client), &config.cache_dir).with_progress(Arc::new(SilentProgress));

    let err = run_with(&config, &collector).await.unwrap_err();

    assert_eq!(err.experiment_id(), Some("exp-a"));
    assert!(err.to_string().contains("resolve milestone timestamps"));
    // the detailed result is still cached for later inspection
    assert!(config.cache_dir.join("result_exp-a.json").is_file());
}
