//! Cache behavior against an in-memory forecast source.

use std::sync::Arc;

use chrono::Duration;
use forecast_client::{ForecastCache, ForecastError};
use test_utils::{indexed_value, run_start, sample_meta, wind_meta, FakeSource, ManualClock};
use wind_common::Selector;

fn gfs() -> Selector {
    Selector::Model("gfs".to_string())
}

async fn wait_for_meta_calls(source: &FakeSource, calls: usize) {
    while source.meta_calls() < calls {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_hit_does_not_refetch() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    let cache = ForecastCache::new(source.clone());

    let first = cache.ensure_loaded(&gfs(), false).await.unwrap().unwrap();
    let second = cache.ensure_loaded(&gfs(), false).await.unwrap().unwrap();

    assert_eq!(source.meta_calls(), 1);
    assert_eq!(source.dump_calls(), 1);
    assert!(Arc::ptr_eq(&first.meta, &second.meta));
    assert!(Arc::ptr_eq(&first.field, &second.field));

    let stats = cache.stats();
    assert_eq!((stats.misses, stats.hits, stats.loads), (1, 1, 1));
}

#[tokio::test]
async fn test_loaded_field_reads_exact_values() {
    let meta = wind_meta();
    let source = Arc::new(FakeSource::new(meta.clone()));
    let cache = ForecastCache::new(source);

    let loaded = cache.ensure_loaded(&gfs(), false).await.unwrap().unwrap();
    let dims = loaded.field.dims();
    let sample = loaded.field.sample(2, 3, 4).unwrap();

    assert_eq!(sample.u, indexed_value(dims, 2, 2, 3, 4, 0));
    assert_eq!(sample.v, indexed_value(dims, 2, 2, 3, 4, 1));
    assert_eq!(*loaded.meta, meta);
}

#[tokio::test]
async fn test_reduced_and_full_are_distinct_keys() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    let cache = ForecastCache::new(source.clone());

    cache.ensure_loaded(&gfs(), true).await.unwrap();
    cache.ensure_loaded(&gfs(), false).await.unwrap();
    cache.ensure_loaded(&gfs(), false).await.unwrap();

    assert_eq!(source.meta_calls(), 2);
    let current = cache.current().await.unwrap();
    assert_eq!(current.key.as_str(), "gfs@model#full");
}

#[tokio::test]
async fn test_force_reload_refetches() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    let cache = ForecastCache::new(source.clone());

    let first = cache.ensure_loaded(&gfs(), false).await.unwrap().unwrap();
    let reloaded = cache.force_reload(&gfs(), false).await.unwrap().unwrap();

    assert_eq!(source.meta_calls(), 2);
    assert!(!Arc::ptr_eq(&first.field, &reloaded.field));
    assert_eq!(first.field.values(), reloaded.field.values());
}

#[tokio::test]
async fn test_loaded_at_comes_from_clock() {
    let clock = Arc::new(ManualClock::new(run_start()));
    clock.advance(Duration::hours(2));
    let cache = ForecastCache::with_clock(Arc::new(FakeSource::new(wind_meta())), clock);

    let loaded = cache.ensure_loaded(&gfs(), false).await.unwrap().unwrap();
    assert_eq!(loaded.loaded_at, run_start() + Duration::hours(2));
}

#[tokio::test]
async fn test_concurrent_caller_gets_current_entry() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    let cache = Arc::new(ForecastCache::new(source.clone()));
    let gate = source.hold_next();

    let loader = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.ensure_loaded(&gfs(), false).await })
    };
    wait_for_meta_calls(&source, 1).await;

    // Nothing cached yet: the second caller gets nothing and starts no load.
    assert!(cache.is_loading().await);
    assert!(cache.ensure_loaded(&gfs(), false).await.unwrap().is_none());
    assert_eq!(source.meta_calls(), 1);

    gate.notify_one();
    let loaded = loader.await.unwrap().unwrap().unwrap();

    let again = cache.ensure_loaded(&gfs(), false).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&loaded.field, &again.field));
    assert_eq!(cache.stats().busy, 1);
    assert!(!cache.is_loading().await);
}

#[tokio::test]
async fn test_busy_caller_with_other_key_gets_previous_entry() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    let cache = Arc::new(ForecastCache::new(source.clone()));
    cache.ensure_loaded(&gfs(), false).await.unwrap();

    let gate = source.hold_next();
    let loader = {
        let cache = cache.clone();
        tokio::spawn(async move {
            cache
                .ensure_loaded(&Selector::Model("ecmwf".to_string()), false)
                .await
        })
    };
    wait_for_meta_calls(&source, 2).await;

    let served = cache
        .ensure_loaded(&Selector::Model("arpege".to_string()), false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(served.key.as_str(), "gfs@model#full");

    gate.notify_one();
    loader.await.unwrap().unwrap();
    assert_eq!(cache.current().await.unwrap().key.as_str(), "ecmwf@model#full");
}

#[tokio::test]
async fn test_superseded_load_does_not_commit() {
    let old = sample_meta(&[0.0, 3.0], 2, 2, &["u", "v"]);
    let mut new = old.clone();
    new.source = "gfs_2024011518.grb2".to_string();

    let source = Arc::new(FakeSource::new(old));
    let cache = Arc::new(ForecastCache::new(source.clone()));
    let gate = source.hold_next();

    let stale = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.ensure_loaded(&gfs(), false).await })
    };
    wait_for_meta_calls(&source, 1).await;

    source.set_meta(new);
    let fresh = cache.force_reload(&gfs(), false).await.unwrap().unwrap();
    assert_eq!(fresh.meta.source, "gfs_2024011518.grb2");

    gate.notify_one();
    let superseded = stale.await.unwrap().unwrap().unwrap();
    assert_eq!(superseded.meta.source, "gfs_2024011512.grb2");

    let current = cache.current().await.unwrap();
    assert_eq!(current.meta.source, "gfs_2024011518.grb2");
    assert!(cache.matches_file("gfs_2024011518.grb2").await);
    assert_eq!(cache.stats().stale_discarded, 1);
    assert_eq!(cache.stats().loads, 1);
}

#[tokio::test]
async fn test_length_mismatch_keeps_previous_entry() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    let cache = ForecastCache::new(source.clone());
    let before = cache.ensure_loaded(&gfs(), false).await.unwrap().unwrap();

    source.set_dump(Some("u,v"), &[0.0; 3]);
    let err = cache
        .ensure_loaded(&Selector::Model("ecmwf".to_string()), false)
        .await
        .unwrap_err();

    assert!(matches!(err, ForecastError::LengthMismatch { actual: 3, .. }));
    let current = cache.current().await.unwrap();
    assert!(Arc::ptr_eq(&current.field, &before.field));
    assert!(!cache.is_loading().await);
    assert_eq!(cache.stats().failures, 1);
}

#[tokio::test]
async fn test_invalid_meta_is_rejected() {
    let mut meta = wind_meta();
    meta.steps_hours = vec![0.0, 6.0, 3.0];
    let source = Arc::new(FakeSource::new(wind_meta()));
    source.set_meta(meta);
    let cache = ForecastCache::new(source.clone());

    let err = cache.ensure_loaded(&gfs(), false).await.unwrap_err();
    assert!(matches!(err, ForecastError::Meta(_)));
    assert_eq!(source.dump_calls(), 0);
    assert!(cache.current().await.is_none());
}

#[tokio::test]
async fn test_transport_error_surfaces_status() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    source.set_status(Some(502));
    let cache = ForecastCache::new(source.clone());

    let err = cache.ensure_loaded(&gfs(), false).await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert!(!cache.is_loading().await);

    source.set_status(None);
    assert!(cache.ensure_loaded(&gfs(), false).await.unwrap().is_some());
}

#[tokio::test]
async fn test_invalidate_clears_entry() {
    let cache = ForecastCache::new(Arc::new(FakeSource::new(wind_meta())));
    cache.ensure_loaded(&gfs(), false).await.unwrap();

    cache.invalidate().await;
    assert!(cache.current().await.is_none());
    assert!(!cache.matches_file("gfs_2024011512.grb2").await);
}

#[tokio::test]
async fn test_aborted_load_releases_loading_flag() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    let cache = Arc::new(ForecastCache::new(source.clone()));
    let _gate = source.hold_next();

    let loader = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.ensure_loaded(&gfs(), false).await })
    };
    wait_for_meta_calls(&source, 1).await;
    assert!(cache.is_loading().await);

    loader.abort();
    assert!(loader.await.unwrap_err().is_cancelled());
    assert!(!cache.is_loading().await);

    let loaded = cache.ensure_loaded(&gfs(), false).await.unwrap();
    assert!(loaded.is_some());
    assert_eq!(source.meta_calls(), 2);
    assert_eq!(cache.stats().loads, 1);
}

#[tokio::test]
async fn test_timed_out_load_can_be_retried() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    let cache = ForecastCache::new(source.clone());
    let _gate = source.hold_next();

    let timed_out = tokio::time::timeout(
        std::time::Duration::from_millis(20),
        cache.ensure_loaded(&gfs(), false),
    )
    .await;
    assert!(timed_out.is_err());
    assert!(!cache.is_loading().await);

    assert!(cache.ensure_loaded(&gfs(), false).await.unwrap().is_some());
    assert_eq!(source.meta_calls(), 2);
}

#[tokio::test]
async fn test_abandoned_superseded_load_keeps_newer_flag() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    let cache = Arc::new(ForecastCache::new(source.clone()));
    let _gate = source.hold_next();

    let stale = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.ensure_loaded(&gfs(), false).await })
    };
    wait_for_meta_calls(&source, 1).await;

    let newer_gate = source.hold_next();
    let newer = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.force_reload(&gfs(), false).await })
    };
    wait_for_meta_calls(&source, 2).await;

    stale.abort();
    assert!(stale.await.unwrap_err().is_cancelled());
    // The newer load still owns the flag.
    assert!(cache.is_loading().await);

    newer_gate.notify_one();
    assert!(newer.await.unwrap().unwrap().is_some());
    assert!(!cache.is_loading().await);
    assert!(cache.current().await.is_some());
}

#[tokio::test]
async fn test_fetch_meta_skips_dump_and_cache() {
    let source = Arc::new(FakeSource::new(wind_meta()));
    let cache = ForecastCache::new(source.clone());

    let meta = cache.fetch_meta(&gfs()).await.unwrap();

    assert_eq!(meta.source, "gfs_2024011512.grb2");
    assert_eq!((source.meta_calls(), source.dump_calls()), (1, 0));
    assert!(cache.current().await.is_none());
    assert_eq!(cache.stats(), Default::default());
}

#[tokio::test]
async fn test_fetch_meta_validates() {
    let mut meta = wind_meta();
    meta.steps_hours.clear();
    let cache = ForecastCache::new(Arc::new(FakeSource::new(meta)));

    let err = cache.fetch_meta(&gfs()).await.unwrap_err();
    assert!(matches!(err, ForecastError::Meta(_)));
}
