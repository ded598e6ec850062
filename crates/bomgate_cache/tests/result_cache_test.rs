//! Tests for the result cache.

use bomgate_cache::{ResultCache, ResultCacheConfig, ResultCacheConfigBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Summary {
    id: String,
    item_count: u32,
}

#[tokio::test(start_paused = true)]
async fn test_cache_put_and_get() {
    let cache = ResultCache::default();

    let value = json!({"id": "BOM-1", "item_count": 10});
    cache.put("GetResource:bom1", value.clone(), Some(Duration::from_secs(60)));

    assert_eq!(cache.get("GetResource:bom1"), Some(value));
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cache_miss() {
    let cache = ResultCache::default();
    assert!(cache.get("GetResource:missing").is_none());
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_is_removed_on_lookup() {
    let cache = ResultCache::default();
    cache.put("ListResources", json!([1, 2, 3]), Some(Duration::from_secs(5)));

    tokio::time::advance(Duration::from_secs(4)).await;
    assert!(cache.get("ListResources").is_some());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(cache.get("ListResources").is_none());
    assert!(cache.is_empty(), "expired entry should be evicted by the lookup");
}

#[tokio::test(start_paused = true)]
async fn test_default_ttl_applies_when_none_given() {
    let config = ResultCacheConfigBuilder::default()
        .default_ttl(10u64)
        .build()
        .unwrap();
    let cache = ResultCache::new(config);

    cache.put("k", json!(1), None);
    tokio::time::advance(Duration::from_secs(9)).await;
    assert!(cache.get("k").is_some());
    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(cache.get("k").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_put_replaces_and_restarts_ttl() {
    let cache = ResultCache::default();
    cache.put("k", json!("old"), Some(Duration::from_secs(5)));
    tokio::time::advance(Duration::from_secs(4)).await;

    cache.put("k", json!("new"), Some(Duration::from_secs(5)));
    tokio::time::advance(Duration::from_secs(4)).await;

    assert_eq!(cache.get("k"), Some(json!("new")));
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_single_many_and_prefix() {
    let cache = ResultCache::default();
    for key in [
        "GetResource:bom1",
        "GetResource:bom2",
        "ListResourceItems:bom1",
        "ListResources",
    ] {
        cache.put(key, json!(key), None);
    }

    assert!(cache.invalidate("ListResources"));
    assert!(!cache.invalidate("ListResources"));

    assert_eq!(
        cache.invalidate_many(["ListResourceItems:bom1", "GetResource:nope"]),
        1
    );

    assert_eq!(cache.invalidate_prefix("GetResource:"), 2);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disabled_cache_stores_nothing() {
    let cache = ResultCache::new(ResultCacheConfig::default().with_enabled(false));
    cache.put("k", json!(1), None);
    assert!(cache.get("k").is_none());
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_zero_capacity_cache_stores_nothing() {
    let cache = ResultCache::new(ResultCacheConfig::default().with_max_size(0));
    cache.put("k", json!(1), None);
    cache.put_typed("typed", &7u32, Some(Duration::from_secs(60))).unwrap();
    assert!(cache.get("k").is_none());
    assert!(cache.get_typed::<u32>("typed").is_none());
    assert_eq!(cache.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_full_cache_evicts_oldest_entry() {
    let cache = ResultCache::new(ResultCacheConfig::default().with_max_size(2));

    cache.put("first", json!(1), None);
    tokio::time::advance(Duration::from_millis(10)).await;
    cache.put("second", json!(2), None);
    tokio::time::advance(Duration::from_millis(10)).await;
    cache.put("third", json!(3), None);

    assert_eq!(cache.len(), 2);
    assert!(cache.get("first").is_none());
    assert!(cache.get("second").is_some());
    assert!(cache.get("third").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_expired_sweeps_only_stale_entries() {
    let cache = ResultCache::default();
    cache.put("short", json!(1), Some(Duration::from_secs(1)));
    cache.put("long", json!(2), Some(Duration::from_secs(100)));

    tokio::time::advance(Duration::from_secs(2)).await;

    assert_eq!(cache.cleanup_expired(), 1);
    assert_eq!(cache.len(), 1);
    assert!(cache.get("long").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_typed_round_trip_and_shape_mismatch() {
    let cache = ResultCache::default();
    let summary = Summary {
        id: "BOM-7".to_string(),
        item_count: 3,
    };
    cache.put_typed("GetResource:bom7", &summary, None).unwrap();

    let decoded: Option<Summary> = cache.get_typed("GetResource:bom7");
    assert_eq!(decoded, Some(summary));

    cache.put("GetResource:bom8", json!("not a summary"), None);
    let decoded: Option<Summary> = cache.get_typed("GetResource:bom8");
    assert!(decoded.is_none());
    assert!(cache.get("GetResource:bom8").is_none(), "undecodable entry is dropped");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_and_readers() {
    let cache = Arc::new(ResultCache::default());
    let mut handles = Vec::new();

    for task in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for i in 0..100 {
                let key = format!("GetResource:bom{}", i % 10);
                cache.put(&key, json!({"task": task, "i": i}), None);
                let _ = cache.get(&key);
                if i % 7 == 0 {
                    cache.invalidate(&key);
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert!(cache.len() <= 10);
}
