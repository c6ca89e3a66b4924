//! Coarse classification of envelopes for filter matching.

use super::types::{Envelope, EventType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse kind of an envelope.
///
/// New kinds may be added; match with a wildcard arm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Kind {
    Log,
    Metric,
    /// No recognized event type. Never routed.
    Unknown,
}

impl Kind {
    /// Whether an envelope of this kind may be routed at all.
    pub fn is_routable(self) -> bool {
        !matches!(self, Kind::Unknown)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Log => f.write_str("log"),
            Kind::Metric => f.write_str("metric"),
            Kind::Unknown => f.write_str("unknown"),
        }
    }
}

impl From<EventType> for Kind {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::LogMessage => Kind::Log,
            EventType::HttpStartStop
            | EventType::ValueMetric
            | EventType::CounterEvent
            | EventType::Error
            | EventType::ContainerMetric => Kind::Metric,
        }
    }
}

/// Classify an envelope by its declared event type.
pub fn classify(envelope: &Envelope) -> Kind {
    envelope.event_type.map_or(Kind::Unknown, Kind::from)
}
