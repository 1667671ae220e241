//! Protocol message types for WebSocket communication.
//!
//! This module defines the message types a stream client deals with:
//! - Server → Client: Hello, Delta
//! - Client → Server: Subscribe
//!
//! Messages are serialized as JSON over WebSocket text frames.

use serde::{Deserialize, Serialize};
use signalk_core::Delta;

/// Subscription request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub context: String,
    pub subscribe: Vec<Subscription>,
}

impl SubscribeRequest {
    /// Subscribe to every path of the given context.
    pub fn all_paths(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            subscribe: vec![Subscription::path("*")],
        }
    }
}

/// A single subscription entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SubscriptionFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<SubscriptionPolicy>,
    #[serde(rename = "minPeriod", skip_serializing_if = "Option::is_none")]
    pub min_period: Option<u64>,
}

impl Subscription {
    /// Subscription for a path pattern with server defaults.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            period: None,
            format: None,
            policy: None,
            min_period: None,
        }
    }
}

/// Subscription format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionFormat {
    Delta,
    Full,
}

/// Subscription policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPolicy {
    Instant,
    Ideal,
    Fixed,
}

// ============================================================================
// Hello Message (Server → Client on connect)
// ============================================================================

/// Hello message sent by server immediately on WebSocket connection.
///
/// # Example
/// ```json
/// {
///   "name": "signalk-server",
///   "version": "1.7.0",
///   "self": "vessels.urn:mrn:signalk:uuid:c0d79334-4e25-4245-8892-54e8ccc8021d",
///   "roles": ["master", "main"],
///   "timestamp": "2024-01-17T10:30:00.000Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    /// Server name identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// SignalK protocol version supported.
    pub version: String,

    /// The "self" context identifier for this vessel.
    #[serde(rename = "self")]
    pub self_urn: String,

    /// Server roles (e.g., ["main"], ["master", "main"]).
    #[serde(default)]
    pub roles: Vec<String>,

    /// Server timestamp in ISO 8601 format, if the server has a time source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HelloMessage {
    /// Create a new Hello message stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        self_urn: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            version: version.into(),
            self_urn: self_urn.into(),
            roles: vec!["main".to_string()],
            timestamp: Some(
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ),
        }
    }
}

// ============================================================================
// Unified Message Enums
// ============================================================================

/// Messages that can be received from a server.
///
/// Uses untagged deserialization. Hello is tried first since every delta
/// member is optional; any object without `self` and `version` is read as
/// a delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Hello message sent on connection.
    Hello(HelloMessage),

    /// Delta update with new data.
    Delta(Delta),
}

/// Messages that can be sent to a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    /// Subscribe to data paths.
    Subscribe(SubscribeRequest),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_serialization() {
        let hello = HelloMessage::new("test-server", "1.7.0", "vessels.urn:mrn:signalk:uuid:test");
        let json = serde_json::to_string(&hello).unwrap();

        assert!(json.contains("\"name\":\"test-server\""));
        assert!(json.contains("\"version\":\"1.7.0\""));
        assert!(json.contains("\"self\":\"vessels.urn:mrn:signalk:uuid:test\""));
        assert!(json.contains("\"roles\":[\"main\"]"));
    }

    #[test]
    fn test_minimal_hello_deserialization() {
        let json = r#"{"version": "1.7.0", "self": "vessels.urn:mrn:imo:mmsi:230099999"}"#;

        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        match msg {
            ServerMessage::Hello(hello) => {
                assert_eq!(hello.self_urn, "vessels.urn:mrn:imo:mmsi:230099999");
                assert!(hello.name.is_none());
                assert!(hello.roles.is_empty());
            }
            _ => panic!("Expected Hello message"),
        }
    }

    #[test]
    fn test_delta_deserialization() {
        let json = r#"{
            "context": "vessels.urn:mrn:imo:mmsi:230099999",
            "updates": [{"timestamp": "2024-01-17T10:30:00.000Z",
                         "values": [{"path": "navigation.speedOverGround", "value": 3.85}]}]
        }"#;

        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        match msg {
            ServerMessage::Delta(delta) => {
                assert_eq!(delta.updates.len(), 1);
                assert_eq!(delta.updates[0].values[0].path, "navigation.speedOverGround");
            }
            _ => panic!("Expected Delta message"),
        }
    }

    #[test]
    fn test_subscribe_serialization() {
        let msg = ClientMessage::Subscribe(SubscribeRequest::all_paths("vessels.self"));
        let json = serde_json::to_string(&msg).unwrap();

        assert_eq!(json, r#"{"context":"vessels.self","subscribe":[{"path":"*"}]}"#);
    }
}
