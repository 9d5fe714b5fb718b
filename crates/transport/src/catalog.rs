//! Models the backend can run analyses with.
//!
//! Modes that accept a model selector forward the model id verbatim; this
//! catalog lets front ends offer and validate a choice before dispatch.

use std::fmt::{self, Display};

/// The vendor serving a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vendor {
    /// Google Gemini API.
    Gemini,
    /// OpenRouter.
    OpenRouter,
}

impl Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::Gemini => f.write_str("Gemini"),
            Vendor::OpenRouter => f.write_str("OpenRouter"),
        }
    }
}

/// Something a model is good at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Understands images.
    Vision,
    /// Low latency.
    Fast,
    /// Step-by-step reasoning.
    Reasoning,
    /// Suited for detailed analyses.
    Advanced,
    /// Tuned for technical diagrams.
    Technical,
}

/// A known model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelInfo {
    /// The id forwarded to the backend.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Who serves the model.
    pub vendor: Vendor,
    /// What the model is good at.
    pub capabilities: &'static [Capability],
    /// Whether the model is usable on a free tier.
    pub free: bool,
    /// Context window, as advertised.
    pub context: &'static str,
}

impl ModelInfo {
    /// Returns `true` if the model has the given capability.
    #[inline]
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// The model used for vision queries when none is selected.
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.5-flash";

/// Every known model.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gemini-2.5-flash",
        name: "Gemini 2.5 Flash",
        vendor: Vendor::Gemini,
        capabilities: &[Capability::Vision, Capability::Fast],
        free: true,
        context: "1M tokens",
    },
    ModelInfo {
        id: "gemini-2.5-pro",
        name: "Gemini 2.5 Pro",
        vendor: Vendor::Gemini,
        capabilities: &[
            Capability::Vision,
            Capability::Reasoning,
            Capability::Advanced,
        ],
        free: false,
        context: "2M tokens",
    },
    ModelInfo {
        id: "xiaomi/mimo-v2-flash:free",
        name: "Xiaomi MiMo V2 Flash",
        vendor: Vendor::OpenRouter,
        capabilities: &[Capability::Vision, Capability::Fast],
        free: true,
        context: "128K tokens",
    },
    ModelInfo {
        id: "deepseek/deepseek-r1",
        name: "DeepSeek R1",
        vendor: Vendor::OpenRouter,
        capabilities: &[Capability::Reasoning, Capability::Advanced],
        free: false,
        context: "64K tokens",
    },
    ModelInfo {
        id: "nvidia/nemotron-nano-12b-v2-vl:free",
        name: "NVIDIA Nemotron Nano VL",
        vendor: Vendor::OpenRouter,
        capabilities: &[Capability::Vision, Capability::Technical],
        free: true,
        context: "32K tokens",
    },
    ModelInfo {
        id: "qwen/qwen3-235b-a22b",
        name: "Qwen 3 235B",
        vendor: Vendor::OpenRouter,
        capabilities: &[Capability::Reasoning, Capability::Advanced],
        free: false,
        context: "32K tokens",
    },
];

/// Looks up a model by id.
#[inline]
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|model| model.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = MODELS.iter().map(|model| model.id).collect();
        assert_eq!(ids.len(), MODELS.len());
    }

    #[test]
    fn test_default_vision_model() {
        let model = find_model(DEFAULT_VISION_MODEL).unwrap();
        assert!(model.supports(Capability::Vision));
        assert!(find_model("gpt-nonexistent").is_none());
    }
}
