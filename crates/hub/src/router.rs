//! Inbound message decoding.
//!
//! Frames are parsed once into [`InboundMessage`]; every field rule is applied
//! here so the hub only matches on well-formed variants. Anything that fails
//! decoding is dropped by the caller without a reply.

use serde_json::{Map, Value};

use shared::{ws_types, BarcodeResult, ColorState, InteractiveMode};

use crate::assignments::AssignmentTarget;

/// Source recorded for a scan that does not name one.
pub const DEFAULT_BARCODE_SOURCE: &str = "phone";

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Manual colour change from a client. `fields` is the full message as received.
    StateUpdate {
        state: ColorState,
        fields: Map<String, Value>,
    },
    BarcodeResult(BarcodeResult),
    AssignmentUpdate {
        code: String,
        target: AssignmentTarget,
    },
    /// Entries already filtered; clearing targets are kept so the store can omit them.
    AssignmentSync {
        targets: Vec<(String, AssignmentTarget)>,
    },
    InteractiveControl {
        mode: InteractiveMode,
    },
    InteractiveKey,
    Heartbeat,
    /// Well-formed object with a `type` the hub does not handle.
    Unrecognized(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message is not a json object")]
    NotAnObject,
    #[error("missing or non-string type")]
    MissingType,
    #[error("{kind} ignored: {reason}")]
    Ignored {
        kind: &'static str,
        reason: &'static str,
    },
}

fn ignored(kind: &'static str, reason: &'static str) -> DecodeError {
    DecodeError::Ignored { kind, reason }
}

impl InboundMessage {
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(fields) = value else {
            return Err(DecodeError::NotAnObject);
        };
        let msg_type = fields
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(DecodeError::MissingType)?;

        match msg_type.as_str() {
            ws_types::STATE_UPDATE => decode_state_update(fields),
            ws_types::BARCODE_RESULT => decode_barcode_result(&fields).map(Self::BarcodeResult),
            ws_types::ASSIGNMENT_UPDATE => decode_assignment_update(&fields),
            ws_types::ASSIGNMENT_SYNC => decode_assignment_sync(&fields),
            ws_types::INTERACTIVE_CONTROL => {
                let mode = fields
                    .get("mode")
                    .and_then(Value::as_str)
                    .and_then(|m| m.parse().ok())
                    .ok_or_else(|| ignored(ws_types::INTERACTIVE_CONTROL, "invalid mode"))?;
                Ok(Self::InteractiveControl { mode })
            }
            ws_types::INTERACTIVE_KEY => Ok(Self::InteractiveKey),
            ws_types::HEARTBEAT => Ok(Self::Heartbeat),
            other => Ok(Self::Unrecognized(other.to_string())),
        }
    }
}

/// Treat JSON `null` the same as an absent field.
fn field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

fn decode_state_update(fields: Map<String, Value>) -> Result<InboundMessage, DecodeError> {
    const KIND: &str = ws_types::STATE_UPDATE;
    let state = match field(&fields, "state") {
        None => return Err(ignored(KIND, "missing state")),
        Some(Value::String(s)) if s.is_empty() => return Err(ignored(KIND, "missing state")),
        Some(Value::String(s)) => s
            .parse::<ColorState>()
            .map_err(|_| ignored(KIND, "unsupported state"))?,
        Some(_) => return Err(ignored(KIND, "unsupported state")),
    };
    Ok(InboundMessage::StateUpdate { state, fields })
}

fn decode_barcode_result(fields: &Map<String, Value>) -> Result<BarcodeResult, DecodeError> {
    const KIND: &str = ws_types::BARCODE_RESULT;
    let code = match field(fields, "code") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return Err(ignored(KIND, "missing code")),
    };
    let symbology = optional_string(fields, "symbology", "")
        .ok_or_else(|| ignored(KIND, "non-string symbology"))?;
    let source = optional_string(fields, "source", DEFAULT_BARCODE_SOURCE)
        .ok_or_else(|| ignored(KIND, "non-string source"))?;
    let confidence = match field(fields, "confidence") {
        None => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ignored(KIND, "non-numeric confidence"))?,
        Some(_) => return Err(ignored(KIND, "non-numeric confidence")),
    };
    Ok(BarcodeResult {
        code,
        symbology,
        confidence,
        source,
    })
}

/// `Some(default)` when absent, `Some(value)` for a string, `None` for any other type.
fn optional_string(fields: &Map<String, Value>, key: &str, default: &str) -> Option<String> {
    match field(fields, key) {
        None => Some(default.to_string()),
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => None,
    }
}

fn decode_assignment_update(fields: &Map<String, Value>) -> Result<InboundMessage, DecodeError> {
    const KIND: &str = ws_types::ASSIGNMENT_UPDATE;
    // `barcode` is the older spelling; it is only consulted when `code` is empty.
    let code = [field(fields, "code"), field(fields, "barcode")]
        .into_iter()
        .flatten()
        .find(|v| v.as_str().map_or(true, |s| !s.is_empty()))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ignored(KIND, "missing code"))?;

    let target = match field(fields, "state") {
        None => AssignmentTarget::Clear,
        Some(Value::String(s)) => {
            AssignmentTarget::parse(s).ok_or_else(|| ignored(KIND, "unsupported state"))?
        }
        Some(_) => return Err(ignored(KIND, "non-string state")),
    };
    Ok(InboundMessage::AssignmentUpdate {
        code: code.to_string(),
        target,
    })
}

fn decode_assignment_sync(fields: &Map<String, Value>) -> Result<InboundMessage, DecodeError> {
    let Some(Value::Object(raw)) = field(fields, "targets") else {
        return Err(ignored(ws_types::ASSIGNMENT_SYNC, "targets is not an object"));
    };
    let targets = raw
        .iter()
        .filter_map(|(code, state)| {
            let target = AssignmentTarget::parse(state.as_str()?)?;
            Some((code.clone(), target))
        })
        .collect();
    Ok(InboundMessage::AssignmentSync { targets })
}
