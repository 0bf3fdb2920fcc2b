//! JSON serialization for wire events.

use super::types::{InboundEvent, OutboundEvent};

/// Serialize an outbound event to a text frame.
pub fn serialize_outbound(event: &OutboundEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

/// Deserialize an inbound event from a text frame.
pub fn deserialize_inbound(text: &str) -> Result<InboundEvent, serde_json::Error> {
    serde_json::from_str(text)
}
