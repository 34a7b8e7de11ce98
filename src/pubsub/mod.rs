//! Pub/Sub convenience layer
//!
//! # Architecture
//!
//! - [`service`] - The [`PubsubService`] capability trait
//! - [`rest`] - REST implementation of the trait for [`crate::gcp::client::GcpClient`]
//! - [`types`] - Topic and subscription references, options, pages
//! - [`message`] - Outbound and received message envelopes
//! - [`provision`] - Idempotent create-or-reuse of topics and subscriptions
//! - [`ops`] - Publish, pull, acknowledge
//! - [`paginate`] - Page-by-page enumeration with an async handler
//! - [`bulk`] - Pattern-matching bulk deletes
//!
//! # Example
//!
//! ```ignore
//! use oakpubsub::pubsub::{ensure_subscription, ensure_topic, make_message, ops, pluck_ack_ids};
//! use oakpubsub::GcpClient;
//!
//! async fn example(client: &GcpClient) -> oakpubsub::Result<()> {
//!     let topic = ensure_topic(client, "orders").await?;
//!     let sub = ensure_subscription(client, &topic, "orders-worker", Default::default()).await?;
//!     ops::publish(client, &topic, &[make_message(&["a", "b"], None)?]).await?;
//!     let messages = ops::pull(client, &sub, &Default::default()).await?;
//!     ops::acknowledge(client, &sub, &pluck_ack_ids(&messages)).await?;
//!     Ok(())
//! }
//! ```

pub mod bulk;
pub mod message;
pub mod ops;
pub mod paginate;
pub mod provision;
mod rest;
pub mod service;
pub mod types;

pub use bulk::{
    delete_subscriptions_matching, delete_topics_matching, NameMatcher, DEFAULT_CONCURRENCY,
};
pub use message::{
    make_message, pluck_ack_ids, reset_messages, to_outbound, Attributes, OutboundMessage,
    ReceivedMessage,
};
pub use paginate::{
    for_each_page, for_each_subscription_page, for_each_topic_page, list_all_subscriptions,
    list_all_topics, PageSummary, DEFAULT_PAGE_SIZE,
};
pub use provision::{create_subscription, create_topic, ensure_subscription, ensure_topic};
pub use service::PubsubService;
pub use types::{Page, PageQuery, PullOptions, Subscription, SubscriptionOptions, Topic};
