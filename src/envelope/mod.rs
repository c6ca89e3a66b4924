//! Telemetry envelopes as seen by the router.
//!
//! The router only cares about an envelope's [`Kind`], derived from its
//! declared event type, and about turning it into bytes once per send.

mod classify;
mod codec;
mod types;

pub use classify::{classify, Kind};
pub use codec::{encode, PayloadEncoding};
pub use types::{
    ContainerMetric, CounterEvent, Envelope, ErrorEvent, EventType, HttpStartStop, LogMessage,
    MessageType, ValueMetric,
};
