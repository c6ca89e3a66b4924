//! Router tying the registry, classifier and shard selection together.

use crate::envelope::{classify, encode, Envelope, PayloadEncoding};
use crate::error::Result;
use crate::shard::{select_index, RandomSource, SeededRandom, ThreadRandom};
use crate::sink::Sink;
use crate::subscriptions::{
    RoutingKey, Subscription, SubscriptionHandle, SubscriptionRegistry, SubscriptionRequest,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Router configuration.
#[derive(Clone, Debug, Default)]
pub struct RouterConfig {
    /// Encoding of the payload handed to sinks.
    /// Default: MessagePack
    pub encoding: PayloadEncoding,

    /// Seed for shard selection (None = process-seeded).
    pub shard_seed: Option<u64>,
}

/// Point-in-time counts of registered subscriptions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub app_subscriptions: usize,
    pub shard_subscriptions: usize,
    /// Distinct shard ids with at least one member.
    pub shard_groups: usize,
}

/// Fans envelopes out to app streams and firehose shard groups.
///
/// Every method takes `&self`; share a router between threads with `Arc`.
pub struct Router {
    registry: Arc<SubscriptionRegistry>,
    random: Arc<dyn RandomSource>,
    encoding: PayloadEncoding,
}

impl Router {
    /// Create a router with default configuration.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Self {
        let random: Arc<dyn RandomSource> = match config.shard_seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };
        Self::with_random_source(config, random)
    }

    /// Create a router drawing shard selections from `random`.
    ///
    /// `config.shard_seed` is ignored.
    pub fn with_random_source(config: RouterConfig, random: Arc<dyn RandomSource>) -> Self {
        Self {
            registry: Arc::new(SubscriptionRegistry::new()),
            random,
            encoding: config.encoding,
        }
    }

    /// Register a sink for the envelopes described by `request`.
    ///
    /// Fails when the request names neither an app id nor a shard id, or
    /// filters on a kind that is never routed.
    /// The subscription is visible to sends as soon as this returns.
    pub fn register(
        &self,
        request: SubscriptionRequest,
        sink: Arc<dyn Sink>,
    ) -> Result<SubscriptionHandle> {
        let key = request.routing_key()?;
        Ok(self.registry.insert(key, request.filter, sink))
    }

    /// Route one envelope addressed to `app_id`.
    ///
    /// Every matching app stream receives the payload; every firehose shard
    /// group with a matching member has exactly one random member receive
    /// it. Envelopes without a recognized event type go nowhere. Nothing
    /// here is reported to the caller.
    pub fn send_to(&self, app_id: &str, envelope: &Envelope) {
        let kind = classify(envelope);
        if !kind.is_routable() {
            trace!(app_id, origin = %envelope.origin, "dropping envelope without event type");
            return;
        }

        let snapshot = self.registry.snapshot();
        let mut recipients: Vec<&Subscription> = Vec::new();
        let mut groups: BTreeMap<&str, Vec<&Subscription>> = BTreeMap::new();

        for sub in &snapshot {
            if sub.is_released() || !sub.accepts(kind) {
                continue;
            }
            match sub.key() {
                RoutingKey::App(id) if id == app_id => recipients.push(sub),
                RoutingKey::App(_) => {}
                RoutingKey::Shard(shard_id) => {
                    groups.entry(shard_id.as_str()).or_default().push(sub)
                }
            }
        }

        if recipients.is_empty() && groups.is_empty() {
            trace!(app_id, %kind, "no subscribers for envelope");
            return;
        }

        let payload = match encode(envelope, self.encoding) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(app_id, error = %e, "failed to encode envelope, dropping");
                return;
            }
        };

        let mut delivered = recipients
            .into_iter()
            .filter(|sub| sub.deliver(&payload))
            .count();

        // Shard picks happen after the app fan-out, which may release members.
        // A pick that turns out released is dropped from the group and redrawn.
        for members in groups.values_mut() {
            while let Some(index) = select_index(members.len(), self.random.as_ref()) {
                if members[index].deliver(&payload) {
                    delivered += 1;
                    break;
                }
                members.swap_remove(index);
            }
        }

        trace!(app_id, %kind, delivered, bytes = payload.len(), "envelope routed");
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    pub fn stats(&self) -> RouterStats {
        let mut stats = RouterStats::default();
        let mut shards = BTreeSet::new();

        for sub in self.registry.snapshot() {
            match sub.key() {
                RoutingKey::App(_) => stats.app_subscriptions += 1,
                RoutingKey::Shard(shard_id) => {
                    stats.shard_subscriptions += 1;
                    shards.insert(shard_id.clone());
                }
            }
        }
        stats.shard_groups = shards.len();

        trace!(?stats, "router stats");
        stats
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("registry", &self.registry)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}
