//! Resource references and tuning options.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Idle delay between pulls when a subscription stream finds no messages.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of messages requested per pull.
pub const DEFAULT_MAX_MESSAGES: u32 = 100;

/// Last `/`-separated segment of a resource name,
/// e.g. `projects/my-project/topics/orders` -> `orders`
pub fn short_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Project segment of `projects/{project}/...`
fn project_of(name: &str) -> Option<&str> {
    let mut parts = name.split('/');
    match (parts.next(), parts.next()) {
        (Some("projects"), Some(project)) if !project.is_empty() => Some(project),
        _ => None,
    }
}

/// Full resource name for `id` within `collection`, unless `id` already is one
fn resource_name(project_id: &str, collection: &str, id: &str) -> String {
    if id.starts_with("projects/") {
        id.to_string()
    } else {
        format!("projects/{}/{}/{}", project_id, collection, id)
    }
}

/// Reference to a topic: `projects/{project}/topics/{id}`.
///
/// Constructing a reference never touches the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Topic {
    name: String,
}

impl Topic {
    /// Reference a topic by id (or full resource name) within a project
    pub fn new(project_id: &str, id: &str) -> Self {
        Self {
            name: resource_name(project_id, "topics", id),
        }
    }

    /// Wrap a full resource name as returned by the service
    pub fn from_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Full resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short topic id
    pub fn id(&self) -> &str {
        short_name(&self.name)
    }

    pub fn project_id(&self) -> Option<&str> {
        project_of(&self.name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Delivery tuning for a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Seconds the service waits for an ack before redelivering.
    /// `None` leaves the service default (10s).
    pub ack_deadline_seconds: Option<u32>,
    /// Acknowledge every pulled batch before handing it to the caller.
    pub auto_ack: bool,
    /// Idle delay between pulls in [`crate::pubsub::ops::message_stream`].
    pub interval: Duration,
    /// Treat "already exists" on create as success and return the existing subscription.
    pub reuse_existing: bool,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self {
            ack_deadline_seconds: None,
            auto_ack: false,
            interval: DEFAULT_POLL_INTERVAL,
            reuse_existing: false,
        }
    }
}

impl SubscriptionOptions {
    pub fn with_ack_deadline(mut self, seconds: u32) -> Self {
        self.ack_deadline_seconds = Some(seconds);
        self
    }

    pub fn with_auto_ack(mut self, auto_ack: bool) -> Self {
        self.auto_ack = auto_ack;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_reuse_existing(mut self, reuse_existing: bool) -> Self {
        self.reuse_existing = reuse_existing;
        self
    }
}

/// Reference to a subscription bound to exactly one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    name: String,
    topic: Topic,
    #[serde(skip)]
    options: SubscriptionOptions,
}

impl Subscription {
    /// Reference a subscription on `topic`. The subscription lives in the
    /// topic's project unless `id` is already a full resource name.
    pub fn new(topic: &Topic, id: &str, options: SubscriptionOptions) -> Self {
        match topic.project_id() {
            Some(project_id) => Self::in_project(project_id, topic, id, options),
            // Without a project only a full resource name identifies the subscription
            None => Self::from_parts(id, topic.clone(), options),
        }
    }

    /// Reference a subscription in `project_id`, whatever project `topic` is in
    pub fn in_project(
        project_id: &str,
        topic: &Topic,
        id: &str,
        options: SubscriptionOptions,
    ) -> Self {
        Self {
            name: resource_name(project_id, "subscriptions", id),
            topic: topic.clone(),
            options,
        }
    }

    /// Assemble from the parts returned by a listing call
    pub fn from_parts(name: impl Into<String>, topic: Topic, options: SubscriptionOptions) -> Self {
        Self {
            name: name.into(),
            topic,
            options,
        }
    }

    /// Full resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short subscription id
    pub fn id(&self) -> &str {
        short_name(&self.name)
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn options(&self) -> &SubscriptionOptions {
        &self.options
    }

    pub fn project_id(&self) -> Option<&str> {
        project_of(&self.name)
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Options for a single pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOptions {
    pub max_messages: u32,
    /// Ask the service to answer right away instead of waiting for messages
    pub return_immediately: bool,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            return_immediately: false,
        }
    }
}

/// Parameters of one listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page_size: Option<u32>,
    /// Continuation cursor from the previous page; `None` for the first page
    pub page_token: Option<String>,
}

impl PageQuery {
    pub fn first(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
            page_token: None,
        }
    }

    pub fn next(&self, page_token: String) -> Self {
        Self {
            page_size: self.page_size,
            page_token: Some(page_token),
        }
    }
}

/// One page of a listing call
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` on the final page
    pub next_page_token: Option<String>,
    /// Response metadata (the listing response without its item array)
    pub response: Value,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
            response: Value::Null,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }
}
