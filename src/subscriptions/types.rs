//! Subscription types for envelope routing.

use crate::envelope::Kind;
use crate::error::{Result, RouterError};
use crate::sink::Sink;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Unique identifier for a subscription. Never reused within a registry.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Narrows a subscription to one kind of envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Filter {
    pub kind: Kind,
}

impl Filter {
    pub fn new(kind: Kind) -> Self {
        Self { kind }
    }

    /// Log messages only.
    pub fn logs() -> Self {
        Self::new(Kind::Log)
    }

    /// Everything that is not a log message.
    pub fn metrics() -> Self {
        Self::new(Kind::Metric)
    }

    pub fn matches(&self, kind: Kind) -> bool {
        self.kind == kind
    }
}

/// What a caller asks to receive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionRequest {
    /// Application whose envelopes to stream.
    pub app_id: Option<String>,
    /// Firehose consumer group to join.
    pub shard_id: Option<String>,
    pub filter: Option<Filter>,
}

impl SubscriptionRequest {
    /// Stream every envelope addressed to one application.
    pub fn app(app_id: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            ..Default::default()
        }
    }

    /// Join a firehose shard group.
    pub fn firehose(shard_id: impl Into<String>) -> Self {
        Self {
            shard_id: Some(shard_id.into()),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Validate the request and resolve its primary routing key.
    ///
    /// A non-empty shard id wins over an app id: shard members are
    /// firehose consumers regardless of any app id they also carry.
    pub fn routing_key(&self) -> Result<RoutingKey> {
        if let Some(filter) = self.filter {
            if !filter.kind.is_routable() {
                return Err(RouterError::InvalidRequest(format!(
                    "filter kind {} never matches",
                    filter.kind
                )));
            }
        }

        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        if let Some(shard_id) = non_empty(&self.shard_id) {
            return Ok(RoutingKey::Shard(shard_id));
        }
        if let Some(app_id) = non_empty(&self.app_id) {
            return Ok(RoutingKey::App(app_id));
        }
        Err(RouterError::InvalidRequest(
            "either app_id or shard_id must be set".to_string(),
        ))
    }
}

/// How a subscription is addressed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RoutingKey {
    /// Receives every matching envelope sent to this app.
    App(String),
    /// Shares envelopes for all apps with the rest of its shard group.
    Shard(String),
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingKey::App(id) => write!(f, "app:{}", id),
            RoutingKey::Shard(id) => write!(f, "shard:{}", id),
        }
    }
}

/// A live subscription as stored in the registry.
pub struct Subscription {
    id: SubscriptionId,
    key: RoutingKey,
    filter: Option<Filter>,
    sink: Arc<dyn Sink>,
    /// Set once by the first release. Shared with every handle clone.
    released: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        key: RoutingKey,
        filter: Option<Filter>,
        sink: Arc<dyn Sink>,
        released: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            key,
            filter,
            sink,
            released,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn key(&self) -> &RoutingKey {
        &self.key
    }

    pub fn filter(&self) -> Option<Filter> {
        self.filter
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Check if this subscription wants envelopes of `kind`.
    pub fn accepts(&self, kind: Kind) -> bool {
        if !kind.is_routable() {
            return false;
        }
        self.filter.map_or(true, |f| f.matches(kind))
    }

    /// Hand a payload to the sink unless the subscription was released.
    pub(crate) fn deliver(&self, payload: &[u8]) -> bool {
        if self.is_released() {
            return false;
        }
        self.sink.accept(payload);
        true
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("filter", &self.filter)
            .field("released", &self.is_released())
            .finish()
    }
}
