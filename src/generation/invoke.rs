//! Deterministic generator invocation.
//!
//! Builds exactly one [`ConditioningPayload`] per request, seeds the random
//! source once, applies the placement plan and makes a single engine call.
//! Nothing is retried.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::engine::{
    seeded_rng, AudioConditioning, Conditioning, ConditioningPayload, InferenceEngine,
    RawModelOutput,
};
use crate::error::{Result, SynthError};
use crate::placement::PlacementPlan;
use crate::types::{GenerationRequest, Modality};

/// Decodes the ordered reference images to RGB.
///
/// Fails on the first missing or undecodable file, before any engine work.
pub fn load_reference_images(paths: &[PathBuf]) -> Result<Vec<RgbImage>> {
    paths.iter().map(|path| load_rgb(path)).collect()
}

fn load_rgb(path: &Path) -> Result<RgbImage> {
    if !path.is_file() {
        return Err(SynthError::input_not_found(path));
    }
    let image = image::open(path).map_err(|e| SynthError::input_unreadable(path, e))?;
    tracing::debug!(path = %path.display(), width = image.width(), height = image.height(), "reference image loaded");
    Ok(image.to_rgb8())
}

/// Runs one generation for `request` under `plan`.
///
/// `images` are the decoded reference images for edit requests and are
/// ignored otherwise.
pub fn invoke(
    engine: &mut dyn InferenceEngine,
    request: &GenerationRequest,
    images: &[RgbImage],
    plan: PlacementPlan,
) -> Result<RawModelOutput> {
    let metadata = engine.metadata().clone();
    if metadata.modality != request.modality() {
        return Err(SynthError::engine(format!(
            "model '{}' serves {}, not {}",
            metadata.model_id,
            metadata.modality,
            request.modality()
        )));
    }

    let conditioning = match request {
        GenerationRequest::Image(r) => Conditioning::Image {
            prompt: &r.prompt,
            negative_prompt: &r.negative_prompt,
            guidance_scale: r.guidance_scale,
        },
        GenerationRequest::Edit(r) => Conditioning::Edit {
            images,
            prompt: &r.prompt,
            negative_prompt: &r.negative_prompt,
            true_cfg_scale: r.cfg_scale,
        },
        GenerationRequest::Audio(r) => {
            let audio = metadata.audio.ok_or_else(|| {
                SynthError::engine(format!("audio model '{}' reports no sample rate", metadata.model_id))
            })?;
            Conditioning::Audio {
                conditioning: AudioConditioning {
                    prompt: &r.prompt,
                    seconds_start: 0.0,
                    seconds_total: r.duration_seconds,
                },
                cfg_scale: r.cfg_scale,
                sample_size: audio.sample_size,
                sigma_min: r.sigma_min,
                sigma_max: r.sigma_max,
                sampler: &r.sampler,
            }
        }
    };

    let payload = ConditioningPayload {
        conditioning,
        steps: request.steps(),
        num_samples: 1,
        rng: seeded_rng(request.seed()),
    };

    engine.place(plan)?;
    tracing::debug!(plan = %plan, steps = payload.steps, seed = request.seed(), "calling engine");
    let output = engine.generate(payload)?;

    let expected = match request.modality() {
        Modality::Image | Modality::Edit => "images",
        Modality::Audio => "waveform",
    };
    if output.kind() != expected {
        return Err(SynthError::engine(format!(
            "expected {} from '{}', got {}",
            expected,
            metadata.model_id,
            output.kind()
        )));
    }

    Ok(output)
}
