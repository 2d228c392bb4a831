/// Complete Resolution Flow Test
///
/// Tests the full key resolution flow:
/// First call → bulk load + subscription → cache hit → change events → teardown

#[path = "../common/mod.rs"]
mod common;
use common::{eventually, TestKeys, TestServiceBuilder};

use keycache_application::ports::ResolutionOrigin;
use keycache_domain::DomainError;
use keycache_infrastructure::keys::InitPhase;
use std::sync::Arc;

// ============================================================================
// Full Resolution Flow Tests
// ============================================================================

#[tokio::test]
async fn test_complete_resolution_flow() {
    // Arrange
    let (store, service) = TestServiceBuilder::new().build();

    // Act
    let resolution = service.resolve(TestKeys::groq_url()).await.unwrap();

    // Assert
    assert_eq!(&*resolution.value, "https://api.groq.example/v1");
    assert_eq!(resolution.origin, ResolutionOrigin::Cache);
    assert_eq!(store.fetch_all_calls(), 1);
    assert_eq!(store.subscribe_calls(), 1);
    assert_eq!(store.fetch_one_calls(), 0);
    assert_eq!(service.initializer().phase(), InitPhase::Completed);
}

#[tokio::test]
async fn test_every_seeded_key_cached_by_first_call() {
    let (store, service) = TestServiceBuilder::new().build();

    service.resolve(TestKeys::groq_url()).await.unwrap();

    assert_eq!(service.resolve_cached(TestKeys::api_token()).as_deref(), Some("tok-123"));
    assert_eq!(service.cache().len(), TestKeys::seed().len());
    assert_eq!(store.fetch_one_calls(), 0);
}

#[tokio::test]
async fn test_concurrent_first_calls_initialize_once() {
    let (store, service) = TestServiceBuilder::new().build();
    let service = Arc::new(service);

    let mut calls = Vec::new();
    for _ in 0..32 {
        let service = Arc::clone(&service);
        calls.push(tokio::spawn(async move {
            service.resolve(TestKeys::groq_url()).await
        }));
    }
    for call in calls {
        assert!(call.await.unwrap().is_ok());
    }

    assert_eq!(store.fetch_all_calls(), 1);
    assert_eq!(store.subscribe_calls(), 1);
    assert_eq!(store.active_subscriptions().await, 1);
}

#[tokio::test]
async fn test_remote_edits_flow_into_cache() {
    // Arrange
    let (store, service) = TestServiceBuilder::new().build();
    service.start().await.unwrap();

    // Act
    store.upsert(TestKeys::groq_url(), "https://moved.example").await;
    store.upsert(TestKeys::feature_flag(), "on").await;
    assert!(store.delete(TestKeys::api_token()).await);

    // Assert
    eventually(|| {
        service.resolve_cached(TestKeys::groq_url()).as_deref() == Some("https://moved.example")
            && service.resolve_cached(TestKeys::feature_flag()).as_deref() == Some("on")
            && service.resolve_cached(TestKeys::api_token()).is_none()
    })
    .await;
    assert_eq!(store.fetch_one_calls(), 0);
}

#[tokio::test]
async fn test_unknown_key_point_fetched_then_not_found() {
    let (store, service) = TestServiceBuilder::empty().build();
    service.start().await.unwrap();

    let resolution = service.resolve(TestKeys::nonexistent()).await;

    assert_eq!(
        resolution,
        Err(DomainError::KeyNotFound(TestKeys::nonexistent().to_string()))
    );
    assert_eq!(store.fetch_one_calls(), 1);
    assert!(service.resolve_cached(TestKeys::nonexistent()).is_none());
}

#[tokio::test]
async fn test_stats_reflect_activity() {
    let (_store, service) = TestServiceBuilder::new().build();

    service.resolve(TestKeys::groq_url()).await.unwrap();
    service.resolve(TestKeys::groq_url()).await.unwrap();
    service.resolve_cached(TestKeys::nonexistent());
    let stats = service.stats().await;

    assert_eq!(stats.entries, 2);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.init_attempts, 1);
    assert_eq!(stats.init_phase, InitPhase::Completed);
    assert!(stats.subscription_active);
    assert!(stats.static_fallback_enabled);
}

#[tokio::test]
async fn test_teardown_then_restart() {
    // Arrange
    let (store, service) = TestServiceBuilder::new().build();
    service.start().await.unwrap();

    // Act
    service.teardown().await;

    // Assert - nothing cached, subscription released, no automatic reload
    assert!(service.cache().is_empty());
    assert_eq!(store.active_subscriptions().await, 0);
    assert_eq!(service.initializer().phase(), InitPhase::NotStarted);
    assert!(service.resolve_cached(TestKeys::groq_url()).is_none());

    service.start().await.unwrap();
    assert_eq!(store.fetch_all_calls(), 2);
    assert_eq!(store.active_subscriptions().await, 1);
    assert!(service.resolve_cached(TestKeys::groq_url()).is_some());
}
