//! Idempotent provisioning
//!
//! Creation is attempted first; an "already exists" answer resolves to a
//! reference to the existing resource. There is no existence check up front,
//! so concurrent callers converge on the same resource instead of racing
//! between a check and a create.

use super::service::PubsubService;
use super::types::{Subscription, SubscriptionOptions, Topic};
use crate::error::Result;

/// Create a topic. An existing topic is an error.
pub async fn create_topic<S>(service: &S, name: &str) -> Result<Topic>
where
    S: PubsubService + ?Sized,
{
    let topic = service.topic(name);
    service.create_topic(&topic).await
}

/// Create a topic, or return the existing one with the same name
pub async fn ensure_topic<S>(service: &S, name: &str) -> Result<Topic>
where
    S: PubsubService + ?Sized,
{
    let topic = service.topic(name);
    match service.create_topic(&topic).await {
        Ok(created) => Ok(created),
        Err(e) if e.is_already_exists() => {
            tracing::debug!("Topic {} already exists, reusing it", topic);
            Ok(topic)
        },
        Err(e) => Err(e),
    }
}

/// Create a subscription on `topic`.
///
/// With `options.reuse_existing` an existing subscription is returned instead
/// of failing, as in [`ensure_subscription`].
pub async fn create_subscription<S>(
    service: &S,
    topic: &Topic,
    id: &str,
    options: SubscriptionOptions,
) -> Result<Subscription>
where
    S: PubsubService + ?Sized,
{
    let subscription = service.subscription(topic, id, options);
    match service.create_subscription(&subscription).await {
        Ok(created) => Ok(created),
        Err(e) if e.is_already_exists() && subscription.options().reuse_existing => {
            tracing::debug!("Subscription {} already exists, reusing it", subscription);
            Ok(subscription)
        },
        Err(e) => Err(e),
    }
}

/// Create a subscription on `topic`, or return the existing one with the same id
pub async fn ensure_subscription<S>(
    service: &S,
    topic: &Topic,
    id: &str,
    options: SubscriptionOptions,
) -> Result<Subscription>
where
    S: PubsubService + ?Sized,
{
    create_subscription(service, topic, id, options.with_reuse_existing(true)).await
}
