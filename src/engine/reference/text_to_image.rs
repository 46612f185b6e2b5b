//! Procedural text-to-image engine.

use image::{DynamicImage, Rgb, RgbImage};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::engine::{
    Conditioning, ConditioningPayload, EngineFailure, EngineMetadata, InferenceEngine,
    RawModelOutput,
};
use crate::placement::{PlacementPlan, StagedResidency};
use crate::types::Modality;

use super::{denoise_rate, text_color, text_seed};

/// Edge length of the square images the registered engine renders.
pub const DEFAULT_SIZE: u32 = 512;

const COMPONENTS: &[&str] = &["text_encoder", "transformer", "vae"];

/// Renders a prompt-colored gradient, denoised from seeded noise.
pub struct ReferenceImageEngine {
    metadata: EngineMetadata,
    width: u32,
    height: u32,
    plan: PlacementPlan,
}

impl ReferenceImageEngine {
    pub fn new(model_id: &str, width: u32, height: u32) -> Self {
        Self {
            metadata: EngineMetadata {
                model_id: model_id.to_string(),
                modality: Modality::Image,
                audio: None,
            },
            width,
            height,
            plan: PlacementPlan::HostOnly,
        }
    }
}

/// Per-pixel target the denoiser converges to.
struct Target {
    near: [f32; 3],
    far: [f32; 3],
    stripe_freq: f32,
    phase: f32,
}

impl Target {
    fn at(&self, x: u32, y: u32, width: u32, height: u32, c: usize) -> f32 {
        let t = (x + y) as f32 / (width + height).max(1) as f32;
        let stripe = (x as f32 * self.stripe_freq + self.phase).sin() * 0.08;
        self.near[c] + (self.far[c] - self.near[c]) * t + stripe
    }
}

impl InferenceEngine for ReferenceImageEngine {
    fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }

    fn place(&mut self, plan: PlacementPlan) -> Result<(), EngineFailure> {
        self.plan = plan;
        Ok(())
    }

    fn generate(&mut self, payload: ConditioningPayload<'_>) -> Result<RawModelOutput, EngineFailure> {
        let (prompt, negative_prompt, guidance_scale) = match payload.conditioning {
            Conditioning::Image {
                prompt,
                negative_prompt,
                guidance_scale,
            } => (prompt, negative_prompt, guidance_scale),
            other => {
                return Err(EngineFailure::Rejected(format!(
                    "{} accepts image conditioning, got {}",
                    self.metadata.model_id,
                    other.modality()
                )))
            }
        };
        if !guidance_scale.is_finite() {
            return Err(EngineFailure::Rejected(format!(
                "guidance_scale must be finite, got {}",
                guidance_scale
            )));
        }
        if payload.steps == 0 {
            return Err(EngineFailure::Rejected("steps must be > 0".to_string()));
        }

        let mut rng = payload.rng;
        let (width, height) = (self.width, self.height);
        let mut residency = StagedResidency::new(self.plan, COMPONENTS);

        let target = residency.run("text_encoder", |_| {
            let positive = text_color(prompt);
            let negative = text_color(negative_prompt);
            let push = |c: usize| {
                (positive[c] + guidance_scale * 0.05 * (positive[c] - negative[c])).clamp(0.0, 1.0)
            };
            let near = [push(0), push(1), push(2)];
            let far = [1.0 - near[1], 1.0 - near[2], 1.0 - near[0]];
            Target {
                near,
                far,
                stripe_freq: 0.02 + (text_seed(prompt) % 64) as f32 * 0.002,
                phase: rng.gen_range(0.0..std::f32::consts::TAU),
            }
        });

        let latent = residency.run("transformer", |_| {
            let len = (width * height * 3) as usize;
            let mut latent: Vec<f32> = (0..len)
                .map(|_| 0.5 + 0.25 * rng.sample::<f32, _>(StandardNormal))
                .collect();
            for step in 0..payload.steps {
                let rate = denoise_rate(step, payload.steps);
                for y in 0..height {
                    for x in 0..width {
                        let base = ((y * width + x) * 3) as usize;
                        for c in 0..3 {
                            let goal = target.at(x, y, width, height, c);
                            latent[base + c] += (goal - latent[base + c]) * rate;
                        }
                    }
                }
            }
            latent
        });

        let image = residency.run("vae", |_| {
            RgbImage::from_fn(width, height, |x, y| {
                let base = ((y * width + x) * 3) as usize;
                let px = |c: usize| (latent[base + c].clamp(0.0, 1.0) * 255.0).round() as u8;
                Rgb([px(0), px(1), px(2)])
            })
        });
        residency.release_all();

        Ok(RawModelOutput::Images(vec![DynamicImage::ImageRgb8(image)]))
    }
}
