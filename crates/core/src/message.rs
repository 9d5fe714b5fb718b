//! Conversation turns.

use chrono::{DateTime, Utc};
use parley_transport::Reply;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person using the assistant.
    User,
    /// The assistant.
    Assistant,
}

/// One conversation turn, as handed to renderers.
///
/// While `is_streaming` is set, `content` is a prefix of the final reply
/// and only ever grows. Error turns are always complete, so `is_error`
/// and `is_streaming` are never set together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique id, assigned when the turn is created.
    pub id: String,
    /// Who produced the turn.
    pub role: Role,
    /// The currently visible text.
    pub content: String,
    /// When the turn was created, or the server-supplied reply time.
    pub timestamp: DateTime<Utc>,
    /// Whether the content is still being revealed.
    pub is_streaming: bool,
    /// Whether the turn reports a failure instead of a reply.
    pub is_error: bool,
    /// Source citations of the reply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    /// Whether a mind-map diagram is attached.
    #[serde(default)]
    pub has_mindmap: bool,
    /// Mermaid source of the attached diagram.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mermaid_code: Option<String>,
    /// Structured detail of the failure, for error turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl Message {
    /// Creates a user turn with its full content.
    pub(crate) fn user(content: String) -> Self {
        Self {
            id: new_id(),
            role: Role::User,
            content,
            timestamp: Utc::now(),
            is_streaming: false,
            is_error: false,
            sources: vec![],
            has_mindmap: false,
            mermaid_code: None,
            error_detail: None,
        }
    }

    /// Creates an empty assistant turn that a reveal will fill in, taking
    /// over every field of `reply` except its text.
    pub(crate) fn reveal_placeholder(reply: &mut Reply) -> Self {
        Self {
            id: new_id(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: reply.timestamp.unwrap_or_else(Utc::now),
            is_streaming: true,
            is_error: false,
            sources: std::mem::take(&mut reply.sources),
            has_mindmap: reply.has_mindmap,
            mermaid_code: reply.mermaid_code.take(),
            error_detail: None,
        }
    }

    /// Creates a complete assistant turn reporting a failure.
    pub(crate) fn assistant_error(
        content: String,
        error_detail: Option<String>,
    ) -> Self {
        Self {
            id: new_id(),
            role: Role::Assistant,
            content,
            timestamp: Utc::now(),
            is_streaming: false,
            is_error: true,
            sources: vec![],
            has_mindmap: false,
            mermaid_code: None,
            error_detail,
        }
    }
}

#[inline]
fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_renderer_field_names() {
        let mut message = Message::assistant_error(
            "The hybrid analysis could not be completed.".to_owned(),
            Some("timeout".to_owned()),
        );
        message.id = "m1".to_owned();
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], json!("assistant"));
        assert_eq!(value["isError"], json!(true));
        assert_eq!(value["isStreaming"], json!(false));
        assert_eq!(value["errorDetail"], json!("timeout"));
        assert!(value.get("sources").is_none());
    }

    #[test]
    fn test_placeholder_takes_reply_metadata() {
        let mut reply = Reply {
            text: "answer".to_owned(),
            timestamp: None,
            sources: vec!["doc1".to_owned()],
            has_mindmap: true,
            mermaid_code: Some("graph TD".to_owned()),
        };
        let message = Message::reveal_placeholder(&mut reply);
        assert!(message.is_streaming);
        assert!(message.content.is_empty());
        assert_eq!(message.sources, ["doc1"]);
        assert_eq!(message.mermaid_code.as_deref(), Some("graph TD"));
        assert_eq!(reply.text, "answer");
    }
}
