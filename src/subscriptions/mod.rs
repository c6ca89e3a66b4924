//! Subscription registry for envelope routing.
//!
//! A subscription is either app-scoped (every matching envelope for one
//! application) or shard-scoped (one member of a firehose consumer group).
//! Both kinds live in the same [`SubscriptionRegistry`], which is safe to
//! mutate while sends are in flight.
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(SubscriptionRegistry::new());
//!
//! let handle = registry.insert(
//!     RoutingKey::App("app-1".to_string()),
//!     Some(Filter::logs()),
//!     sink,
//! );
//!
//! for sub in registry.snapshot() {
//!     println!("{:?}", sub);
//! }
//!
//! handle.release();
//! ```

mod registry;
mod types;

pub use registry::{SubscriptionHandle, SubscriptionRegistry};
pub use types::{Filter, RoutingKey, Subscription, SubscriptionId, SubscriptionRequest};
