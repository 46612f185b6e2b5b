//! Procedural text-to-audio engine.

use ndarray::Array3;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::engine::{
    AudioMetadata, Conditioning, ConditioningPayload, EngineFailure, EngineMetadata,
    InferenceEngine, RawModelOutput,
};
use crate::placement::{PlacementPlan, StagedResidency};
use crate::types::Modality;

use super::text_seed;

/// Native sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Maximum frames per generation (about 47.5 seconds).
pub const SAMPLE_SIZE: usize = 2_097_152;

const CHANNELS: usize = 2;

/// Samplers the engine accepts.
pub const SUPPORTED_SAMPLERS: &[&str] = &[
    "dpmpp-2m-sde",
    "dpmpp-3m-sde",
    "k-heun",
    "k-lms",
    "k-dpmpp-2s-ancestral",
    "k-dpm-2",
    "k-dpm-fast",
];

const COMPONENTS: &[&str] = &["conditioner", "dit", "pretransform"];

const PARTIALS: usize = 4;

/// Renders a stereo drone whose pitch follows the prompt and whose partials,
/// detune and noise bed follow the seed.
pub struct ReferenceAudioEngine {
    metadata: EngineMetadata,
    plan: PlacementPlan,
}

impl ReferenceAudioEngine {
    pub fn new(model_id: &str) -> Self {
        Self {
            metadata: EngineMetadata {
                model_id: model_id.to_string(),
                modality: Modality::Audio,
                audio: Some(AudioMetadata {
                    sample_rate: SAMPLE_RATE,
                    sample_size: SAMPLE_SIZE,
                    channels: CHANNELS as u16,
                }),
            },
            plan: PlacementPlan::HostOnly,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Partial {
    freq: f32,
    amp: f32,
    phase: [f32; CHANNELS],
    detune: [f32; CHANNELS],
}

impl InferenceEngine for ReferenceAudioEngine {
    fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }

    fn place(&mut self, plan: PlacementPlan) -> Result<(), EngineFailure> {
        if plan.is_staged() {
            return Err(EngineFailure::Rejected(
                "audio engines do not support staged offload".to_string(),
            ));
        }
        self.plan = plan;
        Ok(())
    }

    fn generate(&mut self, payload: ConditioningPayload<'_>) -> Result<RawModelOutput, EngineFailure> {
        let (conditioning, cfg_scale, sample_size, sigma_min, sigma_max, sampler) =
            match payload.conditioning {
                Conditioning::Audio {
                    conditioning,
                    cfg_scale,
                    sample_size,
                    sigma_min,
                    sigma_max,
                    sampler,
                } => (conditioning, cfg_scale, sample_size, sigma_min, sigma_max, sampler),
                other => {
                    return Err(EngineFailure::Rejected(format!(
                        "{} accepts audio conditioning, got {}",
                        self.metadata.model_id,
                        other.modality()
                    )))
                }
            };

        if !SUPPORTED_SAMPLERS.contains(&sampler) {
            return Err(EngineFailure::Rejected(format!(
                "unknown sampler '{}' (supported: {})",
                sampler,
                SUPPORTED_SAMPLERS.join(", ")
            )));
        }
        if !(sigma_min.is_finite() && sigma_max.is_finite()) || sigma_min <= 0.0 || sigma_min >= sigma_max {
            return Err(EngineFailure::Rejected(format!(
                "sigma bounds must satisfy 0 < sigma_min < sigma_max, got {} and {}",
                sigma_min, sigma_max
            )));
        }
        if !cfg_scale.is_finite() {
            return Err(EngineFailure::Rejected(format!(
                "cfg_scale must be finite, got {}",
                cfg_scale
            )));
        }
        if !(conditioning.seconds_total.is_finite() && conditioning.seconds_total > 0.0)
            || conditioning.seconds_start < 0.0
        {
            return Err(EngineFailure::Rejected(format!(
                "invalid timing window: start {}s, total {}s",
                conditioning.seconds_start, conditioning.seconds_total
            )));
        }
        if payload.steps == 0 {
            return Err(EngineFailure::Rejected("steps must be > 0".to_string()));
        }

        let frames = ((conditioning.seconds_total as f64 * SAMPLE_RATE as f64).round() as usize)
            .min(sample_size.min(SAMPLE_SIZE));
        let mut rng = payload.rng;
        let mut residency = StagedResidency::new(self.plan, COMPONENTS);

        let partials = residency.run("conditioner", |_| {
            let root = 55.0 * 2f32.powf((text_seed(conditioning.prompt) % 24) as f32 / 12.0);
            let mut partials = [Partial {
                freq: root,
                amp: 1.0,
                phase: [0.0; CHANNELS],
                detune: [1.0; CHANNELS],
            }; PARTIALS];
            for (i, partial) in partials.iter_mut().enumerate() {
                partial.freq = root * (i + 1) as f32 * rng.gen_range(0.995..1.005);
                partial.amp = 1.0 / (i + 1) as f32 * (1.0 + 0.05 * cfg_scale.abs().min(20.0));
                for ch in 0..CHANNELS {
                    partial.phase[ch] = rng.gen_range(0.0..std::f32::consts::TAU);
                    partial.detune[ch] = rng.gen_range(0.998..1.002);
                }
            }
            partials
        });

        let waveform = residency.run("dit", |_| {
            // Residual noise shrinks as the schedule gets longer and tighter.
            let noise_level = 0.02 * (sigma_min / sigma_max).sqrt() / payload.steps as f32;
            let fade = (SAMPLE_RATE as usize / 20).min(frames / 2).max(1);
            let mut waveform = Array3::<f32>::zeros((payload.num_samples.max(1) as usize, CHANNELS, frames));
            for mut batch in waveform.outer_iter_mut() {
                for ch in 0..CHANNELS {
                    let mut smoothed = 0.0f32;
                    for n in 0..frames {
                        let t = n as f32 / SAMPLE_RATE as f32;
                        let mut value = 0.0f32;
                        for partial in &partials {
                            let omega = std::f32::consts::TAU * partial.freq * partial.detune[ch];
                            value += partial.amp * (omega * t + partial.phase[ch]).sin();
                        }
                        let noise: f32 = rng.sample(StandardNormal);
                        smoothed += (noise - smoothed) * 0.05;
                        let envelope = (n.min(frames - 1 - n) as f32 / fade as f32).min(1.0);
                        batch[[ch, n]] = (value * 0.25 + smoothed * noise_level) * envelope;
                    }
                }
            }
            waveform
        });

        let output = residency.run("pretransform", |_| RawModelOutput::Waveform(waveform));
        residency.release_all();
        Ok(output)
    }
}
