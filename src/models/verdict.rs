use serde::{Deserialize, Serialize};

// Category label vocabulary. The heuristic engine only ever produces the
// first two; the rest are reserved for model-backed implementations.
pub const CATEGORY_EXPLICIT_NUDITY: &str = "explicit_nudity";
pub const CATEGORY_GRAPHIC_VIOLENCE: &str = "graphic_violence";
pub const CATEGORY_HATE_SYMBOLS: &str = "hate_symbols";
pub const CATEGORY_SELF_HARM: &str = "self_harm";
pub const CATEGORY_EXTREMIST_CONTENT: &str = "extremist_content";

/// Outcome of one analysis. Produced fresh per request, never cached, and
/// returned to the client exactly as the engine built it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub is_safe: bool,
    pub confidence: f32,
    pub categories: Vec<String>,
    pub details: serde_json::Map<String, serde_json::Value>,
    pub message: String,
}

impl Verdict {
    /// Baseline verdict before any detector has spoken.
    pub fn safe() -> Self {
        Self {
            is_safe: true,
            confidence: 0.95,
            categories: Vec::new(),
            details: serde_json::Map::new(),
            message: "image passed content moderation".to_string(),
        }
    }

    /// Mark a category as triggered. The first flag replaces the baseline
    /// confidence; later flags only raise it.
    pub fn flag(&mut self, category: &str, confidence: f32) {
        if self.is_safe {
            self.confidence = confidence;
        } else {
            self.confidence = self.confidence.max(confidence);
        }
        self.is_safe = false;
        self.categories.push(category.to_string());
    }
}
