use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reply payload as returned by the backend.
///
/// Different endpoints put the reply text in different places: either a
/// top-level `response` field or a nested `message.content`. Flags and
/// diagram payloads come in both snake and camel case. This type accepts
/// all of them; call [`RawReply::normalize`] to get the canonical shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireReply")]
pub struct RawReply {
    /// Reply text, for endpoints that answer with a `response` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Reply message, for endpoints that answer with a message object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<RawMessage>,
    /// Server-side creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Source citations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    /// Whether the reply comes with a mind-map diagram.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_mindmap: Option<bool>,
    /// Mermaid source of the mind-map diagram.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mermaid_code: Option<String>,
}

/// What a backend may actually send. Every spelling of the diagram fields
/// is its own slot, so a payload carrying several of them still decodes;
/// the snake case one wins.
#[derive(Deserialize)]
struct WireReply {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    message: Option<RawMessage>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    sources: Option<Vec<String>>,
    #[serde(default)]
    has_mindmap: Option<bool>,
    #[serde(default, rename = "hasMindMap")]
    has_mind_map_camel: Option<bool>,
    #[serde(default, rename = "hasMindmap")]
    has_mindmap_camel: Option<bool>,
    #[serde(default)]
    mermaid_code: Option<String>,
    #[serde(default, rename = "mermaidCode")]
    mermaid_code_camel: Option<String>,
}

impl From<WireReply> for RawReply {
    fn from(wire: WireReply) -> Self {
        Self {
            response: wire.response,
            message: wire.message,
            timestamp: wire.timestamp,
            sources: wire.sources,
            has_mindmap: wire
                .has_mindmap
                .or(wire.has_mind_map_camel)
                .or(wire.has_mindmap_camel),
            mermaid_code: wire.mermaid_code.or(wire.mermaid_code_camel),
        }
    }
}

/// The nested message object of a [`RawReply`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Server-side creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Source citations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

/// Where a mode expects the reply text to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReplyField {
    /// The top-level `response` field.
    Response,
    /// The nested `message.content` field.
    MessageContent,
}

/// The canonical reply shape used past the transport boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reply {
    /// The complete reply text. Empty when the payload carried none.
    pub text: String,
    /// Server-side creation time, if the payload carried a valid one.
    pub timestamp: Option<DateTime<Utc>>,
    /// Source citations, in the order the backend returned them.
    pub sources: Vec<String>,
    /// Whether the reply comes with a mind-map diagram.
    pub has_mindmap: bool,
    /// Mermaid source of the mind-map diagram.
    pub mermaid_code: Option<String>,
}

impl RawReply {
    /// Creates a payload carrying only a `response` text.
    #[inline]
    pub fn with_response<S: Into<String>>(text: S) -> Self {
        Self {
            response: Some(text.into()),
            ..Default::default()
        }
    }

    /// Creates a payload carrying only a nested `message.content` text.
    #[inline]
    pub fn with_message_content<S: Into<String>>(text: S) -> Self {
        Self {
            message: Some(RawMessage {
                content: Some(text.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Attaches source citations.
    #[inline]
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    /// Attaches a mind-map diagram.
    #[inline]
    pub fn with_mindmap<S: Into<String>>(mut self, mermaid_code: S) -> Self {
        self.has_mindmap = Some(true);
        self.mermaid_code = Some(mermaid_code.into());
        self
    }

    /// Converts the payload into the canonical [`Reply`].
    ///
    /// The text is taken from `preferred` first and from the other field
    /// when the preferred one is missing or empty. A payload without text
    /// under either field yields an
    /// empty reply rather than an error. Top-level metadata wins over
    /// the nested message's.
    pub fn normalize(self, preferred: ReplyField) -> Reply {
        let RawReply {
            response,
            message,
            timestamp,
            sources,
            has_mindmap,
            mermaid_code,
        } = self;
        let RawMessage {
            content,
            timestamp: nested_timestamp,
            sources: nested_sources,
        } = message.unwrap_or_default();

        let (first, second) = match preferred {
            ReplyField::Response => (response, content),
            ReplyField::MessageContent => (content, response),
        };
        let text = first.filter(|text| !text.is_empty()).or(second);

        Reply {
            text: text.unwrap_or_default(),
            timestamp: timestamp
                .or(nested_timestamp)
                .as_deref()
                .and_then(parse_timestamp),
            sources: sources.or(nested_sources).unwrap_or_default(),
            has_mindmap: has_mindmap.unwrap_or(false),
            mermaid_code,
        }
    }
}

/// Parses a server timestamp.
///
/// Accepts RFC 3339, and ISO 8601 without an offset (as produced by
/// Python's `datetime.isoformat()`), which is taken to be UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn from_json(value: serde_json::Value) -> RawReply {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_preferred_field_wins() {
        let raw = from_json(json!({
            "response": "from response",
            "message": { "content": "from message" }
        }));
        assert_eq!(
            raw.clone().normalize(ReplyField::Response).text,
            "from response"
        );
        assert_eq!(
            raw.normalize(ReplyField::MessageContent).text,
            "from message"
        );
    }

    #[test]
    fn test_falls_back_to_other_field() {
        let raw = from_json(json!({ "response": "hi there" }));
        assert_eq!(raw.normalize(ReplyField::MessageContent).text, "hi there");

        let raw = from_json(json!({ "message": { "content": "nested" } }));
        assert_eq!(raw.normalize(ReplyField::Response).text, "nested");
    }

    #[test]
    fn test_empty_preferred_field_falls_back() {
        let raw = from_json(json!({
            "response": "",
            "message": { "content": "real answer" }
        }));
        assert_eq!(raw.normalize(ReplyField::Response).text, "real answer");

        let raw = from_json(json!({ "message": { "content": "" } }));
        assert_eq!(raw.normalize(ReplyField::MessageContent).text, "");
    }

    #[test]
    fn test_missing_text_is_empty() {
        let raw = from_json(json!({ "sources": ["a.pdf"] }));
        let reply = raw.normalize(ReplyField::Response);
        assert_eq!(reply.text, "");
        assert_eq!(reply.sources, ["a.pdf"]);
    }

    #[test]
    fn test_metadata_spellings() {
        let camel = from_json(json!({
            "response": "x",
            "hasMindMap": true,
            "mermaidCode": "graph TD; A-->B"
        }))
        .normalize(ReplyField::Response);
        let snake = from_json(json!({
            "response": "x",
            "has_mindmap": true,
            "mermaid_code": "graph TD; A-->B"
        }))
        .normalize(ReplyField::Response);
        assert_eq!(camel, snake);
        assert!(camel.has_mindmap);
        assert_eq!(camel.mermaid_code.as_deref(), Some("graph TD; A-->B"));
    }

    #[test]
    fn test_mixed_metadata_spellings() {
        let reply = from_json(json!({
            "response": "x",
            "has_mindmap": true,
            "hasMindMap": false,
            "hasMindmap": false,
            "mermaid_code": "graph TD; A-->B",
            "mermaidCode": "graph LR; B-->A"
        }))
        .normalize(ReplyField::Response);
        assert!(reply.has_mindmap);
        assert_eq!(reply.mermaid_code.as_deref(), Some("graph TD; A-->B"));

        let reply = from_json(json!({ "response": "x", "hasMindmap": true }))
            .normalize(ReplyField::Response);
        assert!(reply.has_mindmap);
    }

    #[test]
    fn test_nested_metadata() {
        let reply = from_json(json!({
            "message": {
                "content": "answer",
                "timestamp": "2024-05-01T10:00:00Z",
                "sources": ["doc1", "doc2"]
            }
        }))
        .normalize(ReplyField::MessageContent);
        assert_eq!(reply.sources, ["doc1", "doc2"]);
        assert_eq!(
            reply.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T10:00:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-05-01T10:00:00.250000"),
            Some(expected + chrono::TimeDelta::milliseconds(250))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
