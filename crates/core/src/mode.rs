//! Per-mode framing of a submission.

use parley_transport::{Mode, ReplyField};

/// How a mode frames a turn. The transport operation itself is picked by
/// `TransportClient`.
#[derive(Debug)]
pub(crate) struct ModeSpec {
    /// Prefixed to the echoed user turn.
    pub label: Option<&'static str>,
    /// Whether a selected model is forwarded to the transport.
    pub accepts_model: bool,
    /// Where the reply text is expected first.
    pub reply_field: ReplyField,
    /// Leads the error turn when the dispatch fails.
    pub failure_summary: &'static str,
}

const CHAT: ModeSpec = ModeSpec {
    label: None,
    accepts_model: false,
    reply_field: ReplyField::MessageContent,
    failure_summary: "Sorry, I couldn't process your message",
};

const ADVANCED: ModeSpec = ModeSpec {
    label: Some("[Advanced Analysis]"),
    accepts_model: true,
    reply_field: ReplyField::Response,
    failure_summary: "The advanced analysis could not be completed",
};

const HYBRID: ModeSpec = ModeSpec {
    label: Some("[Hybrid Analysis]"),
    accepts_model: false,
    reply_field: ReplyField::Response,
    failure_summary: "The hybrid analysis could not be completed",
};

const VISION: ModeSpec = ModeSpec {
    label: Some("[Vision Query]"),
    accepts_model: true,
    reply_field: ReplyField::Response,
    failure_summary: "The vision query could not be completed",
};

impl ModeSpec {
    #[inline]
    pub fn of(mode: Mode) -> &'static ModeSpec {
        match mode {
            Mode::Chat => &CHAT,
            Mode::Advanced => &ADVANCED,
            Mode::Hybrid => &HYBRID,
            Mode::Vision => &VISION,
        }
    }

    /// Returns the content of the user turn echoing `query`.
    pub fn echo(&self, query: &str) -> String {
        match self.label {
            Some(label) => format!("{label} {query}"),
            None => query.to_owned(),
        }
    }

    /// Returns the content of the error turn for a failed dispatch.
    pub fn failure_text(&self, error_message: &str) -> String {
        let reason = error_message.trim().trim_end_matches('.');
        if reason.is_empty() {
            format!(
                "{}. Please try again in a moment.",
                self.failure_summary
            )
        } else {
            format!("{}: {reason}. Please try again.", self.failure_summary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo() {
        assert_eq!(ModeSpec::of(Mode::Chat).echo("hello"), "hello");
        assert_eq!(
            ModeSpec::of(Mode::Advanced).echo("check tolerances"),
            "[Advanced Analysis] check tolerances"
        );
    }

    #[test]
    fn test_failure_text() {
        let spec = ModeSpec::of(Mode::Chat);
        assert_eq!(
            spec.failure_text("rate limit"),
            "Sorry, I couldn't process your message: rate limit. Please try again."
        );
        assert_eq!(
            spec.failure_text("  "),
            "Sorry, I couldn't process your message. Please try again in a moment."
        );
        assert_eq!(
            ModeSpec::of(Mode::Vision).failure_text("image too large."),
            "The vision query could not be completed: image too large. Please try again."
        );
    }

    #[test]
    fn test_every_mode_has_distinct_summary() {
        let mut summaries: Vec<_> = Mode::ALL
            .iter()
            .map(|mode| ModeSpec::of(*mode).failure_summary)
            .collect();
        summaries.sort();
        summaries.dedup();
        assert_eq!(summaries.len(), Mode::ALL.len());
    }
}
