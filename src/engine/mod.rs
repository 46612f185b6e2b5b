//! Inference engine boundary.
//!
//! synthkit never implements a generative model. It talks to engines through
//! two traits:
//!
//! - [`ModelLoader`]: turns a model id into a ready engine
//! - [`InferenceEngine`]: accepts a placement plan, then one
//!   [`ConditioningPayload`] per invocation, and returns a [`RawModelOutput`]
//!
//! The built-in [`EngineRegistry`] maps ids to engine factories and ships the
//! procedural [`reference`] engines.

mod loader;
pub mod reference;

#[cfg(test)]
pub(crate) mod testing;

pub use loader::{EngineContext, EngineFactory, EngineRegistry};

use std::fmt;

use image::{DynamicImage, RgbImage};
use ndarray::Array3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};
use crate::placement::PlacementPlan;
use crate::types::Modality;

/// Random source handed to engines. Seeded once per invocation.
pub type SeededRng = ChaCha8Rng;

/// Creates the per-invocation random source.
pub fn seeded_rng(seed: u64) -> SeededRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Facts about a loaded audio engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMetadata {
    /// Native output sample rate in Hz.
    pub sample_rate: u32,
    /// Maximum number of frames one generation produces.
    pub sample_size: usize,
    /// Native channel count.
    pub channels: u16,
}

/// Metadata reported by a loaded engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineMetadata {
    /// Model id the engine was loaded for.
    pub model_id: String,
    /// Pipeline this engine serves.
    pub modality: Modality,
    /// Present for audio engines.
    pub audio: Option<AudioMetadata>,
}

/// Text and timing conditioning for audio engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioConditioning<'a> {
    pub prompt: &'a str,
    pub seconds_start: f32,
    pub seconds_total: f32,
}

/// Modality-specific conditioning, borrowed from the request.
#[derive(Debug, Clone, Copy)]
pub enum Conditioning<'a> {
    Image {
        prompt: &'a str,
        negative_prompt: &'a str,
        guidance_scale: f32,
    },
    Edit {
        /// Ordered input images, background first.
        images: &'a [RgbImage],
        prompt: &'a str,
        negative_prompt: &'a str,
        true_cfg_scale: f32,
    },
    Audio {
        conditioning: AudioConditioning<'a>,
        cfg_scale: f32,
        sample_size: usize,
        sigma_min: f32,
        sigma_max: f32,
        sampler: &'a str,
    },
}

impl Conditioning<'_> {
    pub fn modality(&self) -> Modality {
        match self {
            Conditioning::Image { .. } => Modality::Image,
            Conditioning::Edit { .. } => Modality::Edit,
            Conditioning::Audio { .. } => Modality::Audio,
        }
    }
}

/// Everything an engine needs for one generation.
///
/// Built fresh per invocation and consumed by the call.
#[derive(Debug)]
pub struct ConditioningPayload<'a> {
    pub conditioning: Conditioning<'a>,
    pub steps: u32,
    /// Always 1; batching is not supported.
    pub num_samples: u32,
    pub rng: SeededRng,
}

/// Raw engine output, owned by the normalizer until persisted.
#[derive(Debug, Clone)]
pub enum RawModelOutput {
    /// Generated images; only the first is used.
    Images(Vec<DynamicImage>),
    /// Waveform shaped `(batch, channels, samples)`.
    Waveform(Array3<f32>),
}

impl RawModelOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            RawModelOutput::Images(_) => "images",
            RawModelOutput::Waveform(_) => "waveform",
        }
    }
}

/// Failures reported by engines.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineFailure {
    /// Not enough accelerator memory for the active placement.
    ResourceExhausted(String),
    /// The engine refused the inputs (bad knob, unsupported sampler, ...).
    Rejected(String),
    /// Anything else that went wrong inside the engine.
    Internal(String),
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineFailure::ResourceExhausted(msg) => write!(f, "out of device memory: {}", msg),
            EngineFailure::Rejected(msg) => write!(f, "rejected input: {}", msg),
            EngineFailure::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for EngineFailure {}

impl From<EngineFailure> for SynthError {
    fn from(failure: EngineFailure) -> Self {
        match failure {
            EngineFailure::ResourceExhausted(msg) => SynthError::resource_exhausted(msg),
            other => SynthError::engine(other.to_string()),
        }
    }
}

/// A loaded, callable generative engine.
pub trait InferenceEngine {
    fn metadata(&self) -> &EngineMetadata;

    /// Applies the placement plan. Called once, before [`generate`](Self::generate).
    fn place(&mut self, plan: PlacementPlan) -> std::result::Result<(), EngineFailure>;

    /// Runs one generation.
    fn generate(
        &mut self,
        payload: ConditioningPayload<'_>,
    ) -> std::result::Result<RawModelOutput, EngineFailure>;
}

/// Turns a model id into a ready engine.
pub trait ModelLoader {
    fn load(&self, model_id: &str) -> Result<Box<dyn InferenceEngine>>;
}
