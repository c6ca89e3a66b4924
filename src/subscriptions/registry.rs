//! Concurrent table of live subscriptions.

use crate::sink::Sink;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use super::types::{Filter, RoutingKey, Subscription, SubscriptionId};

/// Holds every live subscription of one router.
///
/// Entries are `Arc`s: a snapshot clones the pointers under the read lock
/// and releases it before anyone touches a sink.
pub struct SubscriptionRegistry {
    /// Active subscriptions by ID, ordered by registration.
    subscriptions: RwLock<BTreeMap<SubscriptionId, Arc<Subscription>>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a subscription and return the handle that removes it.
    pub fn insert(
        self: &Arc<Self>,
        key: RoutingKey,
        filter: Option<Filter>,
        sink: Arc<dyn Sink>,
    ) -> SubscriptionHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let released = Arc::new(AtomicBool::new(false));

        debug!(subscription = %id, key = %key, ?filter, "subscription registered");

        let subscription = Arc::new(Subscription::new(
            id,
            key,
            filter,
            sink,
            Arc::clone(&released),
        ));
        self.subscriptions.write().insert(id, subscription);

        SubscriptionHandle {
            id,
            released,
            registry: Arc::downgrade(self),
        }
    }

    /// Remove a subscription. No-op if it is already gone.
    pub fn remove(&self, id: SubscriptionId) {
        if let Some(sub) = self.subscriptions.write().remove(&id) {
            debug!(subscription = %id, key = %sub.key(), "subscription removed");
        }
    }

    /// Point-in-time copy of every live subscription, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<Subscription>> {
        self.subscriptions.read().values().cloned().collect()
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.subscriptions.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.read().is_empty()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("len", &self.len())
            .finish()
    }
}

/// Removes one subscription when released.
///
/// Clones share the same release flag, so the first `release` from any
/// clone wins and the rest are no-ops. Dropping the handle does not release
/// the subscription.
#[derive(Clone)]
#[must_use = "a subscription stays registered until its handle is released"]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    released: Arc<AtomicBool>,
    registry: Weak<SubscriptionRegistry>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unregister the subscription. Safe to call any number of times.
    ///
    /// Sends that have not yet reached this subscription's sink skip it once
    /// this returns. A delivery already inside the sink is not interrupted.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .finish()
    }
}
