//! Procedural image editing engine.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::engine::{
    Conditioning, ConditioningPayload, EngineFailure, EngineMetadata, InferenceEngine,
    RawModelOutput,
};
use crate::placement::{PlacementPlan, StagedResidency};
use crate::types::Modality;

use super::{denoise_rate, text_color};

const COMPONENTS: &[&str] = &["vision_encoder", "transformer", "vae"];

/// Composites the source image over the background and tints the result
/// toward the prompt's color.
///
/// Output keeps the dimensions of the first (background) image.
pub struct ReferenceEditEngine {
    metadata: EngineMetadata,
    plan: PlacementPlan,
}

impl ReferenceEditEngine {
    pub fn new(model_id: &str) -> Self {
        Self {
            metadata: EngineMetadata {
                model_id: model_id.to_string(),
                modality: Modality::Edit,
                audio: None,
            },
            plan: PlacementPlan::HostOnly,
        }
    }
}

impl InferenceEngine for ReferenceEditEngine {
    fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }

    fn place(&mut self, plan: PlacementPlan) -> Result<(), EngineFailure> {
        self.plan = plan;
        Ok(())
    }

    fn generate(&mut self, payload: ConditioningPayload<'_>) -> Result<RawModelOutput, EngineFailure> {
        let (images, prompt, negative_prompt, cfg) = match payload.conditioning {
            Conditioning::Edit {
                images,
                prompt,
                negative_prompt,
                true_cfg_scale,
            } => (images, prompt, negative_prompt, true_cfg_scale),
            other => {
                return Err(EngineFailure::Rejected(format!(
                    "{} accepts edit conditioning, got {}",
                    self.metadata.model_id,
                    other.modality()
                )))
            }
        };
        let background = images
            .first()
            .ok_or_else(|| EngineFailure::Rejected("at least one input image is required".into()))?;
        if images.len() > 2 {
            return Err(EngineFailure::Rejected(format!(
                "at most two input images are supported, got {}",
                images.len()
            )));
        }
        if !cfg.is_finite() || cfg < 0.0 {
            return Err(EngineFailure::Rejected(format!(
                "true_cfg_scale must be finite and >= 0, got {}",
                cfg
            )));
        }
        if payload.steps == 0 {
            return Err(EngineFailure::Rejected("steps must be > 0".to_string()));
        }

        let mut rng = payload.rng;
        let (width, height) = background.dimensions();
        let mut residency = StagedResidency::new(self.plan, COMPONENTS);

        let composite = residency.run("vision_encoder", |_| {
            let mut composite = background.clone();
            if let Some(source) = images.get(1) {
                let source = imageops::resize(source, width, height, FilterType::Triangle);
                for (dst, src) in composite.pixels_mut().zip(source.pixels()) {
                    for c in 0..3 {
                        dst[c] = ((dst[c] as u16 + src[c] as u16) / 2) as u8;
                    }
                }
            }
            composite
        });

        let latent = residency.run("transformer", |_| {
            let tint = text_color(prompt);
            // A single blank negative prompt means no negative guidance.
            let avoid = (!negative_prompt.trim().is_empty()).then(|| text_color(negative_prompt));
            let strength = cfg / (cfg + 4.0) * 0.5;

            let target: Vec<f32> = composite
                .pixels()
                .flat_map(|px| {
                    (0..3).map(move |c| {
                        let base = px[c] as f32 / 255.0;
                        let mut value = base + (tint[c] - base) * strength;
                        if let Some(avoid) = avoid {
                            value += (value - avoid[c]) * strength * 0.25;
                        }
                        value
                    })
                })
                .collect();

            let mut latent: Vec<f32> = target
                .iter()
                .map(|goal| goal + 0.1 * rng.sample::<f32, _>(StandardNormal))
                .collect();
            for step in 0..payload.steps {
                let rate = denoise_rate(step, payload.steps);
                for (value, goal) in latent.iter_mut().zip(&target) {
                    *value += (goal - *value) * rate;
                }
            }
            latent
        });

        let edited = residency.run("vae", |_| {
            RgbImage::from_fn(width, height, |x, y| {
                let base = ((y * width + x) * 3) as usize;
                let px = |c: usize| (latent[base + c].clamp(0.0, 1.0) * 255.0).round() as u8;
                Rgb([px(0), px(1), px(2)])
            })
        });
        residency.release_all();

        Ok(RawModelOutput::Images(vec![DynamicImage::ImageRgb8(edited)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::seeded_rng;

    fn edit(images: &[RgbImage], seed: u64) -> Result<RgbImage, EngineFailure> {
        let mut engine = ReferenceEditEngine::new("reference/edit");
        let payload = ConditioningPayload {
            conditioning: Conditioning::Edit {
                images,
                prompt: "make it snowy",
                negative_prompt: " ",
                true_cfg_scale: 4.0,
            },
            steps: 3,
            num_samples: 1,
            rng: seeded_rng(seed),
        };
        match engine.generate(payload)? {
            RawModelOutput::Images(images) => Ok(images[0].to_rgb8()),
            other => panic!("unexpected {}", other.kind()),
        }
    }

    #[test]
    fn keeps_background_dimensions() {
        let background = RgbImage::from_pixel(20, 10, Rgb([200, 100, 50]));
        let source = RgbImage::from_pixel(7, 7, Rgb([0, 0, 255]));
        let edited = edit(&[background, source], 0).unwrap();
        assert_eq!(edited.dimensions(), (20, 10));
    }

    #[test]
    fn deterministic_for_seed() {
        let background = RgbImage::from_pixel(8, 8, Rgb([90, 90, 90]));
        let a = edit(std::slice::from_ref(&background), 5).unwrap();
        let b = edit(std::slice::from_ref(&background), 5).unwrap();
        assert_eq!(a.into_raw(), b.into_raw());
    }

    #[test]
    fn rejects_empty_image_list() {
        assert!(matches!(edit(&[], 0), Err(EngineFailure::Rejected(_))));
    }

    #[test]
    fn rejects_negative_cfg() {
        let mut engine = ReferenceEditEngine::new("reference/edit");
        let images = [RgbImage::new(4, 4)];
        let payload = ConditioningPayload {
            conditioning: Conditioning::Edit {
                images: &images,
                prompt: "x",
                negative_prompt: " ",
                true_cfg_scale: -1.0,
            },
            steps: 1,
            num_samples: 1,
            rng: seeded_rng(0),
        };
        assert!(matches!(engine.generate(payload), Err(EngineFailure::Rejected(_))));
    }
}
