use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// An interaction mode.
///
/// Modes differ in the backend operation they call and in how the turn
/// is framed, never in how the conversation state evolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Plain chat against the attached documents.
    Chat,
    /// Multi-stage analysis.
    Advanced,
    /// Retrieval combined with model analysis.
    Hybrid,
    /// A question about images or drawings.
    Vision,
}

impl Mode {
    /// Every mode, in declaration order.
    pub const ALL: [Mode; 4] =
        [Mode::Chat, Mode::Advanced, Mode::Hybrid, Mode::Vision];

    /// Returns the identifier used in logs and wire payloads.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Chat => "chat",
            Mode::Advanced => "advanced",
            Mode::Hybrid => "hybrid",
            Mode::Vision => "vision",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
