//! Message operations: publish, pull, acknowledge.
//!
//! Every function takes the service and the topic or subscription it acts on.

use super::message::{pluck_ack_ids, OutboundMessage, ReceivedMessage};
use super::service::PubsubService;
use super::types::{PullOptions, Subscription, SubscriptionOptions, Topic};
use crate::error::Result;
use futures::stream::{self, Stream};
use std::collections::VecDeque;

/// Reference a topic in the service's project. No network call.
pub fn get_topic<S>(service: &S, name: &str) -> Topic
where
    S: PubsubService + ?Sized,
{
    service.topic(name)
}

/// Reference a subscription on `topic`. No network call.
pub fn get_subscription<S>(
    service: &S,
    topic: &Topic,
    id: &str,
    options: SubscriptionOptions,
) -> Subscription
where
    S: PubsubService + ?Sized,
{
    service.subscription(topic, id, options)
}

/// Publish a batch and return the server-assigned ids in order
pub async fn publish<S>(
    service: &S,
    topic: &Topic,
    messages: &[OutboundMessage],
) -> Result<Vec<String>>
where
    S: PubsubService + ?Sized,
{
    if messages.is_empty() {
        return Ok(Vec::new());
    }
    service.publish(topic, messages).await
}

/// Pull one batch. With `auto_ack` set on the subscription the batch is
/// acknowledged before it is returned.
pub async fn pull<S>(
    service: &S,
    subscription: &Subscription,
    options: &PullOptions,
) -> Result<Vec<ReceivedMessage>>
where
    S: PubsubService + ?Sized,
{
    let messages = service.pull(subscription, options).await?;

    if subscription.options().auto_ack && !messages.is_empty() {
        acknowledge(service, subscription, &pluck_ack_ids(&messages)).await?;
    }

    Ok(messages)
}

/// Acknowledge delivered messages. An empty list returns immediately.
pub async fn acknowledge<S>(
    service: &S,
    subscription: &Subscription,
    ack_ids: &[String],
) -> Result<()>
where
    S: PubsubService + ?Sized,
{
    if ack_ids.is_empty() {
        return Ok(());
    }
    service.acknowledge(subscription, ack_ids).await
}

pub async fn delete_topic<S>(service: &S, topic: &Topic) -> Result<()>
where
    S: PubsubService + ?Sized,
{
    service.delete_topic(topic).await
}

pub async fn delete_subscription<S>(service: &S, subscription: &Subscription) -> Result<()>
where
    S: PubsubService + ?Sized,
{
    service.delete_subscription(subscription).await
}

/// Messages from repeated pulls, one at a time.
///
/// Sleeps for the subscription's `interval` whenever a pull comes back empty.
/// A failed pull is yielded as an error and ends the stream.
pub fn message_stream<'a, S>(
    service: &'a S,
    subscription: &'a Subscription,
    options: PullOptions,
) -> impl Stream<Item = Result<ReceivedMessage>> + 'a
where
    S: PubsubService + ?Sized,
{
    let initial = (VecDeque::new(), options, false);

    stream::unfold(initial, move |(mut buffer, options, done)| async move {
        if done {
            return None;
        }
        loop {
            if let Some(message) = buffer.pop_front() {
                return Some((Ok(message), (buffer, options, false)));
            }
            match pull(service, subscription, &options).await {
                Ok(batch) if batch.is_empty() => {
                    tokio::time::sleep(subscription.options().interval).await;
                },
                Ok(batch) => buffer.extend(batch),
                Err(e) => return Some((Err(e), (buffer, options, true))),
            }
        }
    })
}
