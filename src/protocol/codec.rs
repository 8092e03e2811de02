//! Frame codec: untrusted text in, typed events out.
//!
//! Decode policy: a frame that is not JSON, or that lacks a string `type`
//! discriminator, or that names a known type with a malformed payload is a
//! [`DecodeError`], logged by the caller and dropped, never fatal. A
//! well-formed frame with an unrecognized discriminator decodes to
//! [`ServerEvent::Unknown`] so newer backends keep working.

use serde_json::Value;

use super::types::{ServerEvent, StartCommand};

/// Failure to decode an inbound frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("frame has no string `type` discriminator")]
    MissingType,

    #[error("malformed `{event_type}` frame: {source}")]
    Malformed {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to encode the outbound start command.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("temperature must be finite, got {0}")]
    NonFiniteTemperature(f64),

    #[error("model must not be empty")]
    EmptyModel,

    #[error("failed to serialize command: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a raw text frame into a typed event.
pub fn decode(raw: &str) -> Result<ServerEvent, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(DecodeError::Json)?;

    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?
        .to_string();

    if !ServerEvent::is_known_type(&event_type) {
        return Ok(ServerEvent::Unknown { event_type });
    }

    serde_json::from_value(value).map_err(|source| DecodeError::Malformed { event_type, source })
}

/// Outbound frame wrapper carrying the fixed `action` discriminator.
#[derive(serde::Serialize)]
struct StartFrame<'a> {
    action: &'static str,
    #[serde(flatten)]
    command: &'a StartCommand,
}

/// Validate and serialize the start command to a wire frame.
pub fn encode(command: &StartCommand) -> Result<String, EncodeError> {
    if !command.temperature.is_finite() {
        return Err(EncodeError::NonFiniteTemperature(command.temperature));
    }
    if command.model.trim().is_empty() {
        return Err(EncodeError::EmptyModel);
    }

    let frame = StartFrame {
        action: "start",
        command,
    };
    Ok(serde_json::to_string(&frame)?)
}
