use mime::Mime;
use parley_transport::{DispatchRequest, ErrorKind, Mode, RawReply};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatBody<'a> {
    conversation_id: &'a str,
    message: &'a str,
    document_ids: &'a [String],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalysisBody<'a> {
    conversation_id: &'a str,
    query: &'a str,
    document_ids: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    model_id: Option<&'a str>,
}

#[inline]
pub fn create_body(mode: Mode, req: &DispatchRequest) -> Value {
    let body = match mode {
        Mode::Chat => serde_json::to_value(ChatBody {
            conversation_id: &req.conversation_id,
            message: &req.query,
            document_ids: &req.document_ids,
        }),
        Mode::Advanced | Mode::Hybrid | Mode::Vision => {
            serde_json::to_value(AnalysisBody {
                conversation_id: &req.conversation_id,
                query: &req.query,
                document_ids: &req.document_ids,
                model_id: req.model_id.as_deref(),
            })
        }
    };
    // Both bodies are plain structs of strings, which always serialize.
    body.unwrap_or(Value::Null)
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// Extracts a human-readable message from an error body.
///
/// FastAPI-style backends answer errors with `{"detail": ...}`, where the
/// detail is either a string or a list of validation errors.
pub fn error_message(body: &str) -> Option<String> {
    let detail = serde_json::from_str::<ErrorBody>(body).ok()?.detail?;
    match detail {
        Value::String(message) if !message.trim().is_empty() => Some(message),
        Value::Array(items) => {
            let messages: Vec<_> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

#[inline]
pub fn kind_for_status(status: u16) -> ErrorKind {
    match status {
        429 => ErrorKind::RateLimitExceeded,
        400..=499 => ErrorKind::Rejected,
        500..=599 => ErrorKind::Server,
        _ => ErrorKind::Other,
    }
}

/// Builds the error for a non-success response. A blank body is not kept
/// as detail.
pub fn error_from_status(status: StatusCode, body: String) -> Error {
    let message = error_message(&body)
        .unwrap_or_else(|| format!("server responded with {status}"));
    let err = Error::new(message, kind_for_status(status.as_u16()));
    if body.trim().is_empty() {
        err
    } else {
        err.with_detail(body)
    }
}

/// Whether a `Content-Type` header value denotes JSON, including
/// `+json` suffixed types.
pub fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|v| v.parse().ok())
        .map(|m: Mime| {
            m.subtype() == mime::JSON
                || m.suffix().is_some_and(|s| s == mime::JSON)
        })
        .unwrap_or(false)
}

pub fn decode_reply(body: String) -> Result<RawReply, Error> {
    serde_json::from_str::<RawReply>(&body).map_err(|err| {
        Error::new(format!("invalid reply: {err}"), ErrorKind::MalformedReply)
            .with_detail(body)
    })
}
