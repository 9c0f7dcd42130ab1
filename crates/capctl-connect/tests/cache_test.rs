//! Building a controller from the node cache

use capctl_connect::{ControlError, Controller, ControllerConfig, NodeCache, Transport};
use tempfile::tempdir;

#[tokio::test]
async fn test_from_cache_missing_file() {
    let dir = tempdir().unwrap();
    let cache = NodeCache::new(dir.path().join("absent.txt"));

    let err = Controller::from_cache(&cache, Transport::Plaintext, ControllerConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::CacheRead { .. }));
}

#[tokio::test]
async fn test_from_cache_empty_file() {
    let dir = tempdir().unwrap();
    let cache = NodeCache::new(dir.path().join("nodes.txt"));
    cache.store(&[]).unwrap();

    let err = Controller::from_cache(&cache, Transport::Plaintext, ControllerConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::CacheEmpty(_)));
}

#[tokio::test]
async fn test_from_cache_rejects_bad_address() {
    let dir = tempdir().unwrap();
    let cache = NodeCache::new(dir.path().join("nodes.txt"));
    cache.store(&["ftp://10.0.0.5:7777".to_string()]).unwrap();

    let err = Controller::from_cache(&cache, Transport::Plaintext, ControllerConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidAddress { .. }));
}
