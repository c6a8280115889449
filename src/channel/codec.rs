//! JSON codec for data-channel envelopes.
//!
//! Outbound frames always carry the `type` tag. Inbound frames may also use
//! the older tagless shapes, which are recognised by their payload key.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::messages::{DataPacket, Envelope, TOPIC_WALKTHROUGH_COMPLETED};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("envelope has no type and no recognisable payload")]
    MissingType,
    #[error("unknown envelope type: {0}")]
    UnknownType(String),
    #[error("invalid {kind} envelope: {source}")]
    InvalidBody {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

const KNOWN_TYPES: [&str; 5] = [
    "SLIDE_UPDATE",
    "SCRIPTS_UPDATED",
    "WALKTHROUGH_COMPLETED",
    "TRANSCRIPT_POSITION",
    "AGENT_CONFIG",
];

pub fn encode(envelope: &Envelope) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(envelope)
}

pub fn decode(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Object(mut object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let kind = match object.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(other) => return Err(DecodeError::UnknownType(other.to_string())),
        None => {
            let inferred = infer_type(&object).ok_or(DecodeError::MissingType)?;
            object.insert("type".to_string(), Value::String(inferred.to_string()));
            inferred.to_string()
        }
    };

    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return Err(DecodeError::UnknownType(kind));
    }

    serde_json::from_value(Value::Object(object))
        .map_err(|source| DecodeError::InvalidBody { kind, source })
}

/// Decode a frame in the context of the topic it arrived on
pub fn decode_packet(packet: &DataPacket) -> Result<Envelope, DecodeError> {
    if packet.topic == TOPIC_WALKTHROUGH_COMPLETED {
        return Ok(Envelope::WalkthroughCompleted(Default::default()));
    }
    decode(&packet.payload)
}

/// Decode, logging and discarding anything unusable
pub fn decode_or_drop(packet: &DataPacket) -> Option<Envelope> {
    match decode_packet(packet) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            warn!(
                "Dropping data-channel frame on '{}' ({} bytes): {}",
                packet.topic,
                packet.payload.len(),
                e
            );
            None
        }
    }
}

fn infer_type(object: &Map<String, Value>) -> Option<&'static str> {
    if object.contains_key("transcript_position") {
        Some("TRANSCRIPT_POSITION")
    } else if object.contains_key("agent_config") {
        Some("AGENT_CONFIG")
    } else {
        None
    }
}
