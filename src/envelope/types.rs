//! Structured telemetry envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declared event type of an envelope.
///
/// Discriminants follow the dropsonde wire numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    HttpStartStop = 4,
    LogMessage = 5,
    ValueMetric = 6,
    CounterEvent = 7,
    Error = 8,
    ContainerMetric = 9,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::HttpStartStop => "HttpStartStop",
            EventType::LogMessage => "LogMessage",
            EventType::ValueMetric => "ValueMetric",
            EventType::CounterEvent => "CounterEvent",
            EventType::Error => "Error",
            EventType::ContainerMetric => "ContainerMetric",
        };
        f.write_str(name)
    }
}

/// Output stream a log line was written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Out,
    Err,
}

/// A single log line emitted by an application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    pub message: Vec<u8>,
    pub message_type: MessageType,
    /// Nanoseconds since Unix epoch.
    pub timestamp: i64,
    pub app_id: Option<String>,
    pub source_type: Option<String>,
    pub source_instance: Option<String>,
}

/// Monotonic counter increment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterEvent {
    pub name: String,
    pub delta: u64,
    pub total: Option<u64>,
}

/// Point-in-time gauge reading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueMetric {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

/// Resource usage of one application instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetric {
    pub application_id: String,
    pub instance_index: i32,
    pub cpu_percentage: f64,
    pub memory_bytes: u64,
    pub disk_bytes: u64,
}

/// Timing of one HTTP request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HttpStartStop {
    pub start_timestamp: i64,
    pub stop_timestamp: i64,
    pub method: String,
    pub uri: String,
    pub status_code: i32,
    pub content_length: i64,
    pub application_id: Option<String>,
}

/// Error reported by a platform component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub source: String,
    pub code: i32,
    pub message: String,
}

/// One unit of telemetry.
///
/// Only `event_type` matters for routing; the remaining fields travel
/// through to subscribers in the encoded payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: String,
    pub event_type: Option<EventType>,
    /// Nanoseconds since Unix epoch.
    pub timestamp: Option<i64>,
    pub deployment: Option<String>,
    pub job: Option<String>,
    pub index: Option<String>,
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    pub log_message: Option<LogMessage>,
    pub counter_event: Option<CounterEvent>,
    pub value_metric: Option<ValueMetric>,
    pub container_metric: Option<ContainerMetric>,
    pub http_start_stop: Option<HttpStartStop>,
    pub error: Option<ErrorEvent>,
}

impl Envelope {
    /// Envelope carrying a log line.
    pub fn log(origin: impl Into<String>, message: impl Into<Vec<u8>>) -> Self {
        Self {
            origin: origin.into(),
            event_type: Some(EventType::LogMessage),
            log_message: Some(LogMessage {
                message: message.into(),
                message_type: MessageType::Out,
                timestamp: 0,
                app_id: None,
                source_type: None,
                source_instance: None,
            }),
            ..Default::default()
        }
    }

    /// Envelope carrying a counter increment.
    pub fn counter(origin: impl Into<String>, name: impl Into<String>, delta: u64) -> Self {
        Self {
            origin: origin.into(),
            event_type: Some(EventType::CounterEvent),
            counter_event: Some(CounterEvent {
                name: name.into(),
                delta,
                total: None,
            }),
            ..Default::default()
        }
    }

    /// Envelope carrying a gauge reading.
    pub fn value_metric(
        origin: impl Into<String>,
        name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            event_type: Some(EventType::ValueMetric),
            value_metric: Some(ValueMetric {
                name: name.into(),
                value,
                unit: unit.into(),
            }),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}
