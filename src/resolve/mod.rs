//! Configuration resolver.
//!
//! Merges the raw, optional parameters a user supplied with the fixed
//! default tables in [`defaults`] and validates the result into a
//! [`GenerationRequest`]. Nothing here touches the filesystem or hardware:
//! input images are checked at invocation time and device auto-detection
//! belongs to [`crate::placement`].

pub mod defaults;

use std::path::PathBuf;

use clap::Args;

use crate::config::{AppConfig, Device};
use crate::error::{Result, SynthError};
use crate::types::{AudioRequest, EditRequest, GenerationRequest, ImageRequest, Modality};

/// Raw text-to-image parameters.
#[derive(Debug, Clone, Default, Args)]
pub struct ImageParams {
    /// Text prompt for image generation
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Negative prompt (default: fixed quality-exclusion phrase)
    #[arg(short, long = "negative-prompt", alias = "negative_prompt")]
    pub negative_prompt: Option<String>,

    /// Random seed (default: 433)
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Number of inference steps (default: 40)
    #[arg(long, allow_negative_numbers = true)]
    pub steps: Option<i64>,

    /// Guidance scale (default: 3.0)
    #[arg(short, long = "guidance-scale", alias = "guidance_scale", allow_negative_numbers = true)]
    pub guidance_scale: Option<f32>,

    /// Keep the whole model on the accelerator instead of staged offload
    #[arg(long = "full-residency", aliases = ["use-cuda", "use_cuda"])]
    pub full_residency: bool,

    /// Output filename (default: chroma.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Engine id (default: SYNTHKIT_IMAGE_MODEL or reference/image)
    #[arg(short, long)]
    pub model: Option<String>,
}

/// Raw image editing parameters.
#[derive(Debug, Clone, Default, Args)]
pub struct EditParams {
    /// Path to first input image (background)
    #[arg(long)]
    pub image1: Option<PathBuf>,

    /// Path to second input image (source for editing)
    #[arg(long)]
    pub image2: Option<PathBuf>,

    /// Text prompt for image editing
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Negative prompt (default: a single space)
    #[arg(short, long = "negative-prompt", alias = "negative_prompt")]
    pub negative_prompt: Option<String>,

    /// Random seed (default: 0)
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Number of inference steps (default: 30)
    #[arg(long, allow_negative_numbers = true)]
    pub steps: Option<i64>,

    /// True CFG scale (default: 4.0)
    #[arg(long = "cfg-scale", alias = "cfg_scale", allow_negative_numbers = true)]
    pub cfg_scale: Option<f32>,

    /// Keep the whole model on the accelerator instead of staged offload (requires 20GB VRAM)
    #[arg(long = "full-residency", aliases = ["use-cuda", "use_cuda"])]
    pub full_residency: bool,

    /// Output filename (default: output_image_edit.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Engine id (default: SYNTHKIT_EDIT_MODEL or reference/edit)
    #[arg(short, long)]
    pub model: Option<String>,
}

/// Raw text-to-audio parameters.
#[derive(Debug, Clone, Default, Args)]
pub struct AudioParams {
    /// Text prompt for audio generation
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Audio duration in seconds (default: 30.0)
    #[arg(short, long)]
    pub duration: Option<f32>,

    /// Number of diffusion steps (default: 100)
    #[arg(long, allow_negative_numbers = true)]
    pub steps: Option<i64>,

    /// CFG scale (default: 7.0)
    #[arg(long = "cfg-scale", alias = "cfg_scale", allow_negative_numbers = true)]
    pub cfg_scale: Option<f32>,

    /// Minimum sigma value (default: 0.3)
    #[arg(long = "sigma-min", alias = "sigma_min", allow_negative_numbers = true)]
    pub sigma_min: Option<f32>,

    /// Maximum sigma value (default: 500.0)
    #[arg(long = "sigma-max", alias = "sigma_max", allow_negative_numbers = true)]
    pub sigma_max: Option<f32>,

    /// Sampler type (default: dpmpp-3m-sde)
    #[arg(long)]
    pub sampler: Option<String>,

    /// Random seed (default: 0)
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Device to use (cpu/cuda/metal), auto-detects if not specified
    #[arg(long, value_parser = parse_device)]
    pub device: Option<Device>,

    /// Output filename (default: output.wav)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Engine id (default: SYNTHKIT_AUDIO_MODEL or reference/audio)
    #[arg(short, long)]
    pub model: Option<String>,
}

fn parse_device(s: &str) -> std::result::Result<Device, String> {
    Device::parse(s).ok_or_else(|| format!("unknown device '{}' (expected auto, cpu, cuda, metal)", s))
}

/// Resolves text-to-image parameters.
pub fn resolve_image(params: &ImageParams, config: &AppConfig) -> Result<ImageRequest> {
    use defaults::image as d;

    Ok(ImageRequest {
        model_id: model_id(params.model.as_deref(), config, Modality::Image),
        prompt: required_prompt(params.prompt.as_deref(), "prompt")?,
        negative_prompt: params
            .negative_prompt
            .clone()
            .unwrap_or_else(|| d::NEGATIVE_PROMPT.to_string()),
        seed: params.seed.map(seed_value).transpose()?.unwrap_or(d::SEED),
        steps: step_count(params.steps.unwrap_or(d::STEPS))?,
        guidance_scale: params.guidance_scale.unwrap_or(d::GUIDANCE_SCALE),
        full_residency: params.full_residency,
        output: params.output.clone().unwrap_or_else(|| PathBuf::from(d::OUTPUT)),
    })
}

/// Resolves image editing parameters.
///
/// The reference image list keeps `image1` first and only grows to two
/// entries when `image2` was given.
pub fn resolve_edit(params: &EditParams, config: &AppConfig) -> Result<EditRequest> {
    use defaults::edit as d;

    let image1 = params
        .image1
        .clone()
        .ok_or_else(|| SynthError::missing_field("image1"))?;
    let mut reference_images = vec![image1];
    if let Some(image2) = &params.image2 {
        reference_images.push(image2.clone());
    }

    Ok(EditRequest {
        model_id: model_id(params.model.as_deref(), config, Modality::Edit),
        prompt: required_prompt(params.prompt.as_deref(), "prompt")?,
        negative_prompt: params
            .negative_prompt
            .clone()
            .unwrap_or_else(|| d::NEGATIVE_PROMPT.to_string()),
        seed: params.seed.map(seed_value).transpose()?.unwrap_or(d::SEED),
        steps: step_count(params.steps.unwrap_or(d::STEPS))?,
        cfg_scale: params.cfg_scale.unwrap_or(d::CFG_SCALE),
        reference_images,
        full_residency: params.full_residency,
        output: params.output.clone().unwrap_or_else(|| PathBuf::from(d::OUTPUT)),
    })
}

/// Resolves text-to-audio parameters.
///
/// An explicit `--device` wins; otherwise a non-auto device from the
/// environment is used; otherwise the device is left for probing.
pub fn resolve_audio(params: &AudioParams, config: &AppConfig) -> Result<AudioRequest> {
    use defaults::audio as d;

    let duration_seconds = params.duration.unwrap_or(d::DURATION_SECONDS);
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(SynthError::invalid_duration(duration_seconds as f64));
    }

    let device = params
        .device
        .or(Some(config.device))
        .filter(|device| *device != Device::Auto);

    Ok(AudioRequest {
        model_id: model_id(params.model.as_deref(), config, Modality::Audio),
        prompt: required_prompt(params.prompt.as_deref(), "prompt")?,
        seed: params.seed.map(seed_value).transpose()?.unwrap_or(d::SEED),
        steps: step_count(params.steps.unwrap_or(d::STEPS))?,
        cfg_scale: params.cfg_scale.unwrap_or(d::CFG_SCALE),
        duration_seconds,
        sigma_min: params.sigma_min.unwrap_or(d::SIGMA_MIN),
        sigma_max: params.sigma_max.unwrap_or(d::SIGMA_MAX),
        sampler: params
            .sampler
            .clone()
            .unwrap_or_else(|| d::SAMPLER.to_string()),
        device,
        output: params.output.clone().unwrap_or_else(|| PathBuf::from(d::OUTPUT)),
    })
}

impl ImageParams {
    /// Resolves into a [`GenerationRequest`].
    pub fn resolve(&self, config: &AppConfig) -> Result<GenerationRequest> {
        resolve_image(self, config).map(GenerationRequest::Image)
    }
}

impl EditParams {
    /// Resolves into a [`GenerationRequest`].
    pub fn resolve(&self, config: &AppConfig) -> Result<GenerationRequest> {
        resolve_edit(self, config).map(GenerationRequest::Edit)
    }
}

impl AudioParams {
    /// Resolves into a [`GenerationRequest`].
    pub fn resolve(&self, config: &AppConfig) -> Result<GenerationRequest> {
        resolve_audio(self, config).map(GenerationRequest::Audio)
    }
}

fn required_prompt(value: Option<&str>, field: &str) -> Result<String> {
    let prompt = value.ok_or_else(|| SynthError::missing_field(field))?;
    if prompt.trim().is_empty() {
        return Err(SynthError::empty_prompt(field));
    }
    Ok(prompt.to_string())
}

fn step_count(steps: i64) -> Result<u32> {
    if steps <= 0 {
        return Err(SynthError::invalid_steps(steps));
    }
    u32::try_from(steps).map_err(|_| {
        SynthError::new(
            crate::error::ErrorCode::ValidationError,
            format!("Step count too large: {}", steps),
        )
    })
}

fn seed_value(seed: i64) -> Result<u64> {
    u64::try_from(seed).map_err(|_| SynthError::invalid_seed(seed))
}

fn model_id(explicit: Option<&str>, config: &AppConfig, modality: Modality) -> String {
    explicit
        .map(str::to_string)
        .unwrap_or_else(|| config.model_for(modality).to_string())
}
