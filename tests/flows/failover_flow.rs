#[path = "../common/mod.rs"]
mod common;
use common::{TestKeys, TestServiceBuilder};

use keycache_application::ports::ResolutionOrigin;
use keycache_domain::DomainError;
use keycache_infrastructure::keys::InitPhase;
use std::time::Duration;

// ============================================================================
// Failover Tests
// ============================================================================

#[tokio::test]
async fn test_store_down_at_startup_then_recovers() {
    // Arrange
    let (store, service) = TestServiceBuilder::new().build();
    store.set_unreachable(true);

    // Act
    let first = service.resolve(TestKeys::groq_url()).await;
    store.set_unreachable(false);
    let second = service.resolve(TestKeys::groq_url()).await.unwrap();

    // Assert
    assert!(matches!(first, Err(DomainError::Unreachable { .. })));
    assert_eq!(second.origin, ResolutionOrigin::Cache);
    assert_eq!(store.fetch_all_calls(), 2);
    assert_eq!(store.active_subscriptions().await, 1);
    assert_eq!(service.initializer().phase(), InitPhase::Completed);
}

#[tokio::test]
async fn test_subscription_rejected_then_point_fetch_serves() {
    let (store, service) = TestServiceBuilder::new().build();
    store.set_reject_subscriptions(true);

    let resolution = service.resolve(TestKeys::groq_url()).await.unwrap();

    // The bulk load already cached the key before the subscription failed
    assert_eq!(resolution.origin, ResolutionOrigin::Cache);
    assert_eq!(service.initializer().phase(), InitPhase::NotStarted);
    assert!(!service.stats().await.subscription_active);
}

#[tokio::test(start_paused = true)]
async fn test_expired_value_served_during_outage() {
    // Arrange - 1s TTL, then an hour without the store
    let (store, service) = TestServiceBuilder::new()
        .with_ttl(Duration::from_secs(1))
        .build();
    service.start().await.unwrap();
    tokio::time::advance(Duration::from_secs(3600)).await;
    store.set_unreachable(true);

    // Act
    let resolution = service.resolve(TestKeys::groq_url()).await.unwrap();

    // Assert
    assert_eq!(resolution.origin, ResolutionOrigin::StaleCache);
    assert_eq!(&*resolution.value, "https://api.groq.example/v1");
    assert_eq!(service.stats().await.stale_served, 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_value_refreshed_after_outage() {
    let (store, service) = TestServiceBuilder::new()
        .with_ttl(Duration::from_secs(1))
        .build();
    service.start().await.unwrap();
    tokio::time::advance(Duration::from_secs(10)).await;

    store.set_unreachable(true);
    let during = service.resolve(TestKeys::groq_url()).await.unwrap();
    store.set_unreachable(false);
    let after = service.resolve(TestKeys::groq_url()).await.unwrap();

    assert_eq!(during.origin, ResolutionOrigin::StaleCache);
    assert_eq!(after.origin, ResolutionOrigin::Remote);
    assert_eq!(service.cache().stale_count(), 0);
}

#[tokio::test]
async fn test_static_fallback_during_total_outage() {
    let (store, service) = TestServiceBuilder::empty()
        .with_static(TestKeys::feature_flag(), "env-val")
        .build();
    store.set_unreachable(true);

    assert_eq!(
        service.get(TestKeys::feature_flag()).await.as_deref(),
        Some("env-val")
    );
    assert_eq!(service.get(TestKeys::nonexistent()).await, None);
}

#[tokio::test]
async fn test_static_fallback_disabled_by_config() {
    let (store, service) = TestServiceBuilder::empty()
        .with_static(TestKeys::feature_flag(), "env-val")
        .with_static_fallback(false)
        .build();
    store.set_unreachable(true);

    assert_eq!(service.get(TestKeys::feature_flag()).await, None);
    assert_eq!(service.get_cached(TestKeys::feature_flag()), None);
}

#[tokio::test(start_paused = true)]
async fn test_stale_remote_value_preferred_over_static() {
    let (store, service) = TestServiceBuilder::new()
        .with_static(TestKeys::groq_url(), "env-val")
        .with_ttl(Duration::from_secs(1))
        .build();
    service.start().await.unwrap();
    tokio::time::advance(Duration::from_secs(3600)).await;
    store.set_unreachable(true);

    assert_eq!(
        service.get(TestKeys::groq_url()).await.as_deref(),
        Some("https://api.groq.example/v1")
    );
}

#[tokio::test]
async fn test_slow_store_shared_by_concurrent_callers() {
    let (store, service) = TestServiceBuilder::new().build();
    store.set_latency(Duration::from_millis(50));

    let (a, b, c) = tokio::join!(
        service.resolve(TestKeys::groq_url()),
        service.resolve(TestKeys::api_token()),
        service.get(TestKeys::groq_url()),
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert!(c.is_some());
    assert_eq!(store.fetch_all_calls(), 1);
    assert_eq!(store.subscribe_calls(), 1);
}
