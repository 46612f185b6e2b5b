//! Procedural reference engines.
//!
//! These stand in for real model weights. Each honors the full engine
//! contract (placement, seeded randomness, conditioning schema, rejection of
//! bad knobs) with a small deterministic generator, so every pipeline runs
//! end-to-end on any host. Output is a function of the payload alone: same
//! payload and seed, same bytes.

mod audio;
mod edit;
mod text_to_image;

pub use self::audio::{ReferenceAudioEngine, SAMPLE_RATE, SAMPLE_SIZE, SUPPORTED_SAMPLERS};
pub use self::edit::ReferenceEditEngine;
pub use self::text_to_image::{ReferenceImageEngine, DEFAULT_SIZE};

use sha2::{Digest, Sha256};

use super::{EngineContext, EngineRegistry, InferenceEngine};

pub const IMAGE_MODEL_ID: &str = "reference/image";
pub const EDIT_MODEL_ID: &str = "reference/edit";
pub const AUDIO_MODEL_ID: &str = "reference/audio";

/// Registers the three reference engines.
pub fn register(registry: &mut EngineRegistry) {
    registry.register(IMAGE_MODEL_ID, |ctx: &EngineContext| {
        Ok(Box::new(ReferenceImageEngine::new(&ctx.model_id, DEFAULT_SIZE, DEFAULT_SIZE))
            as Box<dyn InferenceEngine>)
    });
    registry.register(EDIT_MODEL_ID, |ctx: &EngineContext| {
        Ok(Box::new(ReferenceEditEngine::new(&ctx.model_id)) as Box<dyn InferenceEngine>)
    });
    registry.register(AUDIO_MODEL_ID, |ctx: &EngineContext| {
        Ok(Box::new(ReferenceAudioEngine::new(&ctx.model_id)) as Box<dyn InferenceEngine>)
    });
}

/// Maps text to a stable 64-bit value.
fn text_seed(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Maps text to an RGB color in [0, 1].
fn text_color(text: &str) -> [f32; 3] {
    let seed = text_seed(text);
    [
        (seed & 0xff) as f32 / 255.0,
        ((seed >> 8) & 0xff) as f32 / 255.0,
        ((seed >> 16) & 0xff) as f32 / 255.0,
    ]
}

/// Fraction of the remaining distance covered at `step` of `steps`.
///
/// Never reaches 1, so a trace of the initial noise (and therefore of the
/// seed) survives every schedule length.
fn denoise_rate(step: u32, steps: u32) -> f32 {
    1.0 / (steps - step + 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_seed_is_stable() {
        assert_eq!(text_seed("ambient drone"), text_seed("ambient drone"));
        assert_ne!(text_seed("ambient drone"), text_seed("ambient drones"));
    }

    #[test]
    fn text_color_in_range() {
        for channel in text_color("a red fox") {
            assert!((0.0..=1.0).contains(&channel));
        }
    }

    #[test]
    fn denoise_rate_never_reaches_one() {
        for steps in [1, 10, 40] {
            for step in 0..steps {
                let rate = denoise_rate(step, steps);
                assert!(rate > 0.0 && rate < 1.0);
            }
        }
    }
}
