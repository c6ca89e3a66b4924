//! # Doppler Router
//!
//! The envelope-routing core of a telemetry distribution node. Envelopes
//! tagged with an application id are fanned out to live subscribers that
//! attach and detach concurrently with delivery.
//!
//! ## Core Concepts
//!
//! - **Envelopes**: typed telemetry, classified as log or metric
//! - **App streams**: receive every matching envelope for one application
//! - **Firehose shard groups**: one random member receives each envelope
//! - **Sinks**: transport-owned capabilities that accept encoded payloads
//!
//! ## Example
//!
//! ```ignore
//! use doppler_router::{ChannelSink, Envelope, Filter, Router, SubscriptionRequest};
//!
//! let router = Router::new();
//!
//! let (sink, receiver) = ChannelSink::bounded(1024);
//! let handle = router.register(
//!     SubscriptionRequest::app("app-1").with_filter(Filter::logs()),
//!     Arc::new(sink),
//! )?;
//!
//! router.send_to("app-1", &Envelope::log("router", "hello"));
//! let payload = receiver.recv()?;
//!
//! handle.release();
//! ```

pub mod envelope;
pub mod error;
pub mod router;
pub mod shard;
pub mod sink;
pub mod subscriptions;

// Re-exports
pub use envelope::{classify, encode, Envelope, EventType, Kind, PayloadEncoding};
pub use error::{Result, RouterError};
pub use router::{Router, RouterConfig, RouterStats};
pub use shard::{
    select_index, select_member, select_random, RandomSource, SeededRandom, ThreadRandom,
};
pub use sink::{ChannelSink, FnSink, Sink};
pub use subscriptions::{
    Filter, RoutingKey, Subscription, SubscriptionHandle, SubscriptionId, SubscriptionRegistry,
    SubscriptionRequest,
};
