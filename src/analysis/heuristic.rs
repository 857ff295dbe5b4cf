//! Deterministic reference engine.
//!
//! Pixel-ratio heuristics stand in for a real model: a skin-tone share for
//! nudity, Canny edge density for violence. Good enough to exercise the
//! pipeline end to end; a model-backed `AnalysisEngine` replaces this
//! without touching anything upstream.

use image::{GrayImage, RgbImage};
use imageproc::edges::canny;
use serde_json::json;

use super::{AnalysisEngine, AnalysisError};
use crate::models::verdict::{Verdict, CATEGORY_EXPLICIT_NUDITY, CATEGORY_GRAPHIC_VIOLENCE};

/// Skin-pixel share above which an image is flagged as explicit.
const SKIN_RATIO_THRESHOLD: f32 = 0.3;
/// Edge-pixel share above which an image is flagged as violent.
const EDGE_RATIO_THRESHOLD: f32 = 0.15;
/// Canny hysteresis thresholds.
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

#[derive(Debug, Default)]
pub struct HeuristicEngine;

impl HeuristicEngine {
    pub fn new() -> Self {
        Self
    }
}

struct Detection {
    detected: bool,
    confidence: f32,
    ratio: f32,
}

impl AnalysisEngine for HeuristicEngine {
    fn analyze(&self, image: &[u8]) -> Result<Verdict, AnalysisError> {
        let decoded = image::load_from_memory(image)?;

        let skin = detect_skin(&decoded.to_rgb8());
        let violence = detect_violence(&decoded.to_luma8());

        let mut verdict = Verdict::safe();

        if skin.detected {
            verdict.flag(CATEGORY_EXPLICIT_NUDITY, skin.confidence);
            verdict.details.insert(
                "nudity".into(),
                json!({
                    "detected": true,
                    "confidence": skin.confidence,
                    "skin_ratio": skin.ratio,
                }),
            );
        }

        if violence.detected {
            verdict.flag(CATEGORY_GRAPHIC_VIOLENCE, violence.confidence);
            verdict.details.insert(
                "violence".into(),
                json!({
                    "detected": true,
                    "confidence": violence.confidence,
                    "edge_ratio": violence.ratio,
                }),
            );
        }

        if !verdict.is_safe {
            verdict.message = format!("image flagged for: {}", verdict.categories.join(", "));
        }

        Ok(verdict)
    }
}

/// Share of pixels inside a skin-tone HSV band: H ≤ 40°, S ≥ 20/255,
/// V ≥ 70/255.
fn detect_skin(rgb: &RgbImage) -> Detection {
    let total = (rgb.width() * rgb.height()) as f32;
    let skin_pixels = rgb.pixels().filter(|p| is_skin_tone(p.0)).count() as f32;
    let ratio = if total > 0.0 { skin_pixels / total } else { 0.0 };

    let detected = ratio > SKIN_RATIO_THRESHOLD;
    Detection {
        detected,
        confidence: if detected { (ratio * 2.0).min(0.95) } else { 0.1 },
        ratio,
    }
}

fn is_skin_tone([r, g, b]: [u8; 3]) -> bool {
    let (h, s, v) = rgb_to_hsv(r, g, b);
    h <= 40.0 && s >= 20.0 / 255.0 && v >= 70.0 / 255.0
}

/// Hue in degrees [0, 360), saturation and value in [0, 1].
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    (h, s, v)
}

/// Canny edge density as a crude proxy for violent content.
fn detect_violence(gray: &GrayImage) -> Detection {
    let total = (gray.width() * gray.height()) as f32;
    let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
    let edge_pixels = edges.pixels().filter(|p| p.0[0] > 0).count() as f32;
    let ratio = if total > 0.0 { edge_pixels / total } else { 0.0 };

    let detected = ratio > EDGE_RATIO_THRESHOLD;
    Detection {
        detected,
        confidence: if detected { (ratio * 3.0).min(0.9) } else { 0.05 },
        ratio,
    }
}
