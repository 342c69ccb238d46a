use std::fs;

use formfuse_cli::{load_config, AppConfig, FillEngine};
use tempfile::tempdir;

#[tokio::test]
async fn loads_yaml_overrides() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(
        &path,
        "profile_path: /srv/formfuse/profile.json\n\
         matcher:\n  min_confidence: 6\n\
         fill:\n  similarity_threshold: 700\n  poll:\n    attempts: 3\n    max_total_ms: 400\n",
    )
    .unwrap();

    let config = load_config(Some(path.as_path())).await.unwrap();

    assert_eq!(config.matcher.min_confidence, 6);
    assert_eq!(config.matcher.min_gap, 2);
    assert_eq!(config.fill.similarity_threshold, 700);
    assert_eq!(config.fill.poll.attempts, 3);
    assert_eq!(config.fill.poll.backoff_factor, 1.4);
    assert_eq!(
        config.resolve_profile_path(None).unwrap(),
        std::path::PathBuf::from("/srv/formfuse/profile.json")
    );

    let engine = FillEngine::from_config(&config);
    assert_eq!(engine.matcher().thresholds().min_confidence, 6);
}

#[tokio::test]
async fn missing_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let config = load_config(Some(dir.path().join("absent.yaml").as_path()))
        .await
        .unwrap();
    assert_eq!(config, AppConfig::default());
}

#[tokio::test]
async fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "fill: [oops").unwrap();
    assert!(load_config(Some(path.as_path())).await.is_err());
}
