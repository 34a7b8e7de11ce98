//! Idempotent provisioning against the in-memory service

mod common;

use common::{FakePubsub, PROJECT};
use oakpubsub::pubsub::{
    create_subscription, create_topic, ensure_subscription, ensure_topic, SubscriptionOptions,
    Topic,
};
use oakpubsub::ErrorKind;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_ensure_topic_twice_sequentially() {
    let service = FakePubsub::new();

    let first = ensure_topic(&service, "orders").await.unwrap();
    let second = ensure_topic(&service, "orders").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.name(), format!("projects/{}/topics/orders", PROJECT));
    assert_eq!(service.topic_ids(), vec!["orders".to_string()]);
    // No existence check: both calls went straight to create
    assert_eq!(service.create_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_ensure_topic_concurrently() {
    let service = FakePubsub::new();

    let (a, b) = tokio::join!(
        ensure_topic(&service, "orders"),
        ensure_topic(&service, "orders")
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(service.topic_ids(), vec!["orders".to_string()]);
}

#[tokio::test]
async fn test_plain_create_topic_reports_conflict() {
    let service = FakePubsub::new().with_topics(&["orders"]);

    let err = create_topic(&service, "orders").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AlreadyExists));
}

#[tokio::test]
async fn test_ensure_topic_propagates_other_failures() {
    let service = FakePubsub::new();
    service.fail_creates_with(ErrorKind::PermissionDenied);

    let err = ensure_topic(&service, "orders").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::PermissionDenied));
    assert!(service.topic_ids().is_empty());
}

#[tokio::test]
async fn test_ensure_subscription_returns_existing() {
    let topic = Topic::new(PROJECT, "orders");
    let service = FakePubsub::new()
        .with_topics(&["orders"])
        .with_subscriptions(&topic, &["s1"]);

    let sub = ensure_subscription(&service, &topic, "s1", SubscriptionOptions::default())
        .await
        .unwrap();

    assert_eq!(sub.id(), "s1");
    assert_eq!(sub.topic(), &topic);
    assert_eq!(service.subscription_ids(), vec!["s1".to_string()]);
}

#[tokio::test]
async fn test_ensure_subscription_concurrently() {
    let service = FakePubsub::new().with_topics(&["orders"]);
    let topic = Topic::new(PROJECT, "orders");

    let (a, b) = tokio::join!(
        ensure_subscription(&service, &topic, "worker", SubscriptionOptions::default()),
        ensure_subscription(&service, &topic, "worker", SubscriptionOptions::default())
    );

    assert_eq!(a.unwrap().name(), b.unwrap().name());
    assert_eq!(service.subscription_ids(), vec!["worker".to_string()]);
}

#[tokio::test]
async fn test_create_subscription_honors_reuse_flag() {
    let topic = Topic::new(PROJECT, "orders");
    let service = FakePubsub::new()
        .with_topics(&["orders"])
        .with_subscriptions(&topic, &["s1"]);

    let err = create_subscription(&service, &topic, "s1", SubscriptionOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_already_exists());

    let options = SubscriptionOptions::default()
        .with_reuse_existing(true)
        .with_ack_deadline(60);
    let sub = create_subscription(&service, &topic, "s1", options)
        .await
        .unwrap();
    assert_eq!(sub.options().ack_deadline_seconds, Some(60));
}

#[tokio::test]
async fn test_ensure_subscription_on_missing_topic_fails() {
    let service = FakePubsub::new();
    let topic = Topic::new(PROJECT, "missing");

    let err = ensure_subscription(&service, &topic, "s1", SubscriptionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
}
