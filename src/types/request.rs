//! Generation requests produced by the configuration resolver.
//!
//! A request is immutable once resolved: every knob has a concrete value,
//! defaults included, and the seed is reused verbatim to reproduce output.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::Device;

/// The three pipelines synthkit drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Text-to-image synthesis.
    Image,
    /// Prompted editing of one or two reference images.
    Edit,
    /// Text-to-audio synthesis.
    Audio,
}

impl Modality {
    /// Returns the string representation of the modality.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Image => "image",
            Modality::Edit => "edit",
            Modality::Audio => "audio",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved text-to-image request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Engine id passed to the model loader.
    pub model_id: String,
    /// What to draw.
    pub prompt: String,
    /// What to steer away from. Always present for this modality.
    pub negative_prompt: String,
    /// Seed for the per-invocation random source.
    pub seed: u64,
    /// Number of denoising steps (> 0).
    pub steps: u32,
    /// Classifier-free guidance strength.
    pub guidance_scale: f32,
    /// Keep the whole model on the accelerator instead of staging it.
    pub full_residency: bool,
    /// Where the image is written; the extension picks the format.
    pub output: PathBuf,
}

/// Resolved image editing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    /// Engine id passed to the model loader.
    pub model_id: String,
    /// Editing instruction.
    pub prompt: String,
    /// Negative guidance; a single blank means none.
    pub negative_prompt: String,
    /// Seed for the per-invocation random source.
    pub seed: u64,
    /// Number of denoising steps (> 0).
    pub steps: u32,
    /// True CFG scale.
    pub cfg_scale: f32,
    /// Ordered reference images: the background first, then the optional source.
    pub reference_images: Vec<PathBuf>,
    /// Keep the whole model on the accelerator instead of staging it.
    pub full_residency: bool,
    /// Where the edited image is written.
    pub output: PathBuf,
}

/// Resolved text-to-audio request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRequest {
    /// Engine id passed to the model loader.
    pub model_id: String,
    /// Description of the sound.
    pub prompt: String,
    /// Seed for the per-invocation random source.
    pub seed: u64,
    /// Number of diffusion steps (> 0).
    pub steps: u32,
    /// Classifier-free guidance strength.
    pub cfg_scale: f32,
    /// Requested length of the clip.
    pub duration_seconds: f32,
    /// Lower noise bound of the sampler schedule.
    pub sigma_min: f32,
    /// Upper noise bound of the sampler schedule.
    pub sigma_max: f32,
    /// Sampler name, interpreted by the engine.
    pub sampler: String,
    /// Explicit device intent; None defers to probing.
    pub device: Option<Device>,
    /// Where the WAV file is written.
    pub output: PathBuf,
}

/// A fully resolved request for one of the three pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "lowercase")]
pub enum GenerationRequest {
    Image(ImageRequest),
    Edit(EditRequest),
    Audio(AudioRequest),
}

impl GenerationRequest {
    /// Returns the pipeline this request belongs to.
    pub fn modality(&self) -> Modality {
        match self {
            GenerationRequest::Image(_) => Modality::Image,
            GenerationRequest::Edit(_) => Modality::Edit,
            GenerationRequest::Audio(_) => Modality::Audio,
        }
    }

    pub fn model_id(&self) -> &str {
        match self {
            GenerationRequest::Image(r) => &r.model_id,
            GenerationRequest::Edit(r) => &r.model_id,
            GenerationRequest::Audio(r) => &r.model_id,
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            GenerationRequest::Image(r) => &r.prompt,
            GenerationRequest::Edit(r) => &r.prompt,
            GenerationRequest::Audio(r) => &r.prompt,
        }
    }

    /// Returns the negative prompt, empty for audio.
    pub fn negative_prompt(&self) -> &str {
        match self {
            GenerationRequest::Image(r) => &r.negative_prompt,
            GenerationRequest::Edit(r) => &r.negative_prompt,
            GenerationRequest::Audio(_) => "",
        }
    }

    pub fn seed(&self) -> u64 {
        match self {
            GenerationRequest::Image(r) => r.seed,
            GenerationRequest::Edit(r) => r.seed,
            GenerationRequest::Audio(r) => r.seed,
        }
    }

    pub fn steps(&self) -> u32 {
        match self {
            GenerationRequest::Image(r) => r.steps,
            GenerationRequest::Edit(r) => r.steps,
            GenerationRequest::Audio(r) => r.steps,
        }
    }

    /// Returns the guidance or CFG scale, whichever the modality uses.
    pub fn guidance_scale(&self) -> f32 {
        match self {
            GenerationRequest::Image(r) => r.guidance_scale,
            GenerationRequest::Edit(r) => r.cfg_scale,
            GenerationRequest::Audio(r) => r.cfg_scale,
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            GenerationRequest::Image(r) => &r.output,
            GenerationRequest::Edit(r) => &r.output,
            GenerationRequest::Audio(r) => &r.output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio() -> AudioRequest {
        AudioRequest {
            model_id: "reference/audio".to_string(),
            prompt: "ambient drone".to_string(),
            seed: 1,
            steps: 10,
            cfg_scale: 7.0,
            duration_seconds: 5.0,
            sigma_min: 0.3,
            sigma_max: 500.0,
            sampler: "dpmpp-3m-sde".to_string(),
            device: None,
            output: PathBuf::from("output.wav"),
        }
    }

    #[test]
    fn accessors_dispatch_by_modality() {
        let request = GenerationRequest::Audio(audio());
        assert_eq!(request.modality(), Modality::Audio);
        assert_eq!(request.prompt(), "ambient drone");
        assert_eq!(request.negative_prompt(), "");
        assert_eq!(request.seed(), 1);
        assert_eq!(request.steps(), 10);
        assert_eq!(request.guidance_scale(), 7.0);
        assert_eq!(request.output(), Path::new("output.wav"));
    }

    #[test]
    fn serializes_with_modality_tag() {
        let json = serde_json::to_value(GenerationRequest::Audio(audio())).unwrap();
        assert_eq!(json["modality"], "audio");
        assert_eq!(json["sampler"], "dpmpp-3m-sde");
    }

    #[test]
    fn modality_display() {
        assert_eq!(Modality::Edit.to_string(), "edit");
    }
}
