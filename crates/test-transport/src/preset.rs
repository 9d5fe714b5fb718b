use std::time::Duration;

use parley_transport::RawReply;
use serde::{Deserialize, Serialize};

/// How a scripted call resolves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetOutcome {
    /// The call succeeds with this payload.
    #[serde(rename = "reply")]
    Reply(RawReply),
    /// The call fails.
    #[serde(rename = "failure")]
    Failure {
        /// The error message.
        message: String,
        /// Optional structured detail.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

/// One scripted call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetStep {
    /// How the call resolves.
    pub outcome: PresetOutcome,
    /// How long the call takes, overriding the transport's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl PresetStep {
    /// Creates a step that succeeds with `reply`.
    #[inline]
    pub fn reply(reply: RawReply) -> Self {
        Self {
            outcome: PresetOutcome::Reply(reply),
            delay_ms: None,
        }
    }

    /// Creates a step that fails with `message`.
    #[inline]
    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self {
            outcome: PresetOutcome::Failure {
                message: message.into(),
                detail: None,
            },
            delay_ms: None,
        }
    }

    /// Attaches structured detail to a failing step.
    #[inline]
    pub fn with_detail<S: Into<String>>(mut self, detail: S) -> Self {
        if let PresetOutcome::Failure { detail: slot, .. } = &mut self.outcome
        {
            *slot = Some(detail.into());
        }
        self
    }

    /// Sets how long this call takes.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = Some(delay.as_millis() as u64);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let steps = vec![
            PresetStep::reply(
                RawReply::with_response("Here is the summary.")
                    .with_sources(["report.pdf"]),
            )
            .with_delay(Duration::from_millis(20)),
            PresetStep::failure("rate limit").with_detail("retry after 3s"),
        ];

        let serialized = serde_json::to_string(&steps).unwrap();
        let deserialized: Vec<PresetStep> =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(steps, deserialized);
    }

    #[test]
    fn test_fixture_format() {
        let step: PresetStep = serde_json::from_value(json!({
            "outcome": {
                "type": "reply",
                "data": { "message": { "content": "hi" }, "hasMindMap": false }
            }
        }))
        .unwrap();
        assert_eq!(step.delay_ms, None);
        let PresetOutcome::Reply(reply) = step.outcome else {
            panic!("expected a reply");
        };
        assert_eq!(reply.has_mindmap, Some(false));
    }
}
