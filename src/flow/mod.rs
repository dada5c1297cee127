// Flow event model and wire decoding
//
// A trace session streams JSON lines. Each line is either a transport error,
// a session-ended notice, or a flow record observed by the eBPF tracer.
// Flow records are sparse: every field may be missing, and missing fields
// decode to sentinels instead of failing the record.

pub mod classify;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Sentinel used for any missing name, namespace or address
pub const UNKNOWN: &str = "unknown";

/// Errors raised while decoding one line of a session stream
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("line is not valid JSON or has mistyped fields: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message carries neither a known type nor a flow payload")]
    UnrecognisedMessage,
}

/// Connection lifecycle notification type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Outbound connection initiated by the source pod
    Connect,
    /// Inbound connection accepted by the source pod
    Accept,
    /// Connection torn down
    Close,
    /// Anything else the tracer emitted
    Other(String),
}

impl EventType {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "connect" => EventType::Connect,
            "accept" => EventType::Accept,
            "close" => EventType::Close,
            other => EventType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Connect => "connect",
            EventType::Accept => "accept",
            EventType::Close => "close",
            EventType::Other(other) => other,
        }
    }
}

/// Controller owning the source pod (Deployment, StatefulSet, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub kind: String,
    pub name: String,
}

/// Kubernetes enrichment attached to a destination address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRef {
    pub kind: String,
    pub name: Option<String>,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub address: String,
    pub port: u16,
    pub reference: Option<DestinationRef>,
}

/// One observed connection event, normalized from the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEvent {
    pub event_type: EventType,
    pub source_pod: String,
    pub source_namespace: String,
    pub source_address: String,
    pub source_port: u16,
    pub source_owner: Option<Owner>,
    pub destination: Destination,
    pub error_code: i64,
}

impl FlowEvent {
    pub fn has_error(&self) -> bool {
        self.error_code != 0
    }
}

/// One decoded line of a session stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Transport-level error to surface to the user
    Error { message: String },
    /// The tracer stopped producing events
    SessionEnded { status: String },
    /// A connection event for the graph
    Flow(FlowEvent),
}

impl StreamMessage {
    /// Decode one JSON line
    pub fn parse(line: &str) -> Result<Self, StreamError> {
        let value: Value = serde_json::from_str(line)?;

        match value.get("type").and_then(Value::as_str) {
            Some("error") => {
                return Ok(StreamMessage::Error {
                    message: text_field(&value, "message"),
                })
            }
            Some("session_ended") => {
                return Ok(StreamMessage::SessionEnded {
                    status: text_field(&value, "status"),
                })
            }
            _ => {}
        }

        match value.get("data") {
            Some(data) if data.is_object() => {
                let record = WireRecord::deserialize(data)?;
                Ok(StreamMessage::Flow(record.into()))
            }
            _ => Err(StreamError::UnrecognisedMessage),
        }
    }
}

fn text_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN)
        .to_string()
}

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireRecord {
    #[serde(rename = "type")]
    event_type: Option<String>,
    k8s: Option<WireSource>,
    src: Option<WireEndpoint>,
    dst: Option<WireEndpoint>,
    error: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WireSource {
    pod_name: Option<String>,
    pod: Option<String>,
    namespace: Option<String>,
    owner: Option<WireOwner>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireOwner {
    kind: Option<String>,
    name: Option<String>,
}

/// Endpoints arrive either as a bare address or as a detailed object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireEndpoint {
    Address(String),
    Detailed(WireAddress),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireAddress {
    addr: Option<String>,
    port: Option<u16>,
    k8s: Option<WireRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireRef {
    kind: Option<String>,
    name: Option<String>,
    namespace: Option<String>,
}

/// Empty strings count as missing, like the tracer's own falsy checks
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn or_unknown(value: Option<String>) -> String {
    present(value).unwrap_or_else(|| UNKNOWN.to_string())
}

impl WireEndpoint {
    fn address_and_port(&self) -> (String, u16) {
        match self {
            WireEndpoint::Address(addr) => (or_unknown(Some(addr.clone())), 0),
            WireEndpoint::Detailed(detail) => {
                (or_unknown(detail.addr.clone()), detail.port.unwrap_or(0))
            }
        }
    }
}

impl From<WireRecord> for FlowEvent {
    fn from(record: WireRecord) -> Self {
        let source = record.k8s.unwrap_or_default();
        let source_owner = source.owner.and_then(|owner| {
            match (present(owner.kind), present(owner.name)) {
                (Some(kind), Some(name)) => Some(Owner { kind, name }),
                _ => None,
            }
        });

        let (source_address, source_port) = record
            .src
            .as_ref()
            .map(WireEndpoint::address_and_port)
            .unwrap_or_else(|| (UNKNOWN.to_string(), 0));

        let destination = match record.dst {
            Some(endpoint) => {
                let (address, port) = endpoint.address_and_port();
                let reference = match endpoint {
                    WireEndpoint::Detailed(WireAddress { k8s: Some(r), .. }) => {
                        Some(DestinationRef {
                            kind: r.kind.unwrap_or_default(),
                            name: present(r.name),
                            namespace: or_unknown(r.namespace),
                        })
                    }
                    _ => None,
                };
                Destination {
                    address,
                    port,
                    reference,
                }
            }
            None => Destination {
                address: UNKNOWN.to_string(),
                port: 0,
                reference: None,
            },
        };

        FlowEvent {
            event_type: EventType::from_wire(record.event_type.as_deref().unwrap_or_default()),
            source_pod: or_unknown(source.pod_name.or(source.pod)),
            source_namespace: or_unknown(source.namespace),
            source_address,
            source_port,
            source_owner,
            destination,
            error_code: record.error.unwrap_or(0),
        }
    }
}
