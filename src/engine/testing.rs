//! Engine doubles for unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use image::{DynamicImage, RgbImage};
use ndarray::Array3;

use crate::error::{Result, SynthError};
use crate::placement::PlacementPlan;
use crate::types::Modality;

use super::{
    AudioMetadata, Conditioning, ConditioningPayload, EngineFailure, EngineMetadata,
    InferenceEngine, ModelLoader, RawModelOutput,
};

/// What a [`CannedEngine`] saw, shared with the test.
#[derive(Debug, Default)]
pub struct Observed {
    pub plan: Option<PlacementPlan>,
    pub generate_calls: usize,
    pub image_count: Option<usize>,
    pub first_image_dims: Option<(u32, u32)>,
    pub negative_prompt: Option<String>,
    pub seconds_total: Option<f32>,
    pub sample_size: Option<usize>,
}

/// Engine returning a fixed output.
pub struct CannedEngine {
    metadata: EngineMetadata,
    output: RawModelOutput,
    failure: Option<EngineFailure>,
    pub observed: Rc<RefCell<Observed>>,
}

impl CannedEngine {
    pub fn image(width: u32, height: u32) -> Self {
        Self::new(
            Modality::Image,
            None,
            RawModelOutput::Images(vec![DynamicImage::ImageRgb8(RgbImage::from_pixel(
                width,
                height,
                image::Rgb([10, 20, 30]),
            ))]),
        )
    }

    pub fn audio(waveform: Array3<f32>, sample_rate: u32) -> Self {
        let channels = waveform.shape()[1] as u16;
        Self::new(
            Modality::Audio,
            Some(AudioMetadata {
                sample_rate,
                sample_size: 1 << 20,
                channels,
            }),
            RawModelOutput::Waveform(waveform),
        )
    }

    pub fn new(modality: Modality, audio: Option<AudioMetadata>, output: RawModelOutput) -> Self {
        Self {
            metadata: EngineMetadata {
                model_id: "canned".to_string(),
                modality,
                audio,
            },
            output,
            failure: None,
            observed: Rc::new(RefCell::new(Observed::default())),
        }
    }

    pub fn failing(mut self, failure: EngineFailure) -> Self {
        self.failure = Some(failure);
        self
    }
}

impl InferenceEngine for CannedEngine {
    fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }

    fn place(&mut self, plan: PlacementPlan) -> std::result::Result<(), EngineFailure> {
        self.observed.borrow_mut().plan = Some(plan);
        Ok(())
    }

    fn generate(
        &mut self,
        payload: ConditioningPayload<'_>,
    ) -> std::result::Result<RawModelOutput, EngineFailure> {
        {
            let mut observed = self.observed.borrow_mut();
            observed.generate_calls += 1;
            match payload.conditioning {
                Conditioning::Image { negative_prompt, .. } => {
                    observed.negative_prompt = Some(negative_prompt.to_string());
                }
                Conditioning::Edit {
                    images,
                    negative_prompt,
                    ..
                } => {
                    observed.image_count = Some(images.len());
                    observed.first_image_dims = images.first().map(|img| img.dimensions());
                    observed.negative_prompt = Some(negative_prompt.to_string());
                }
                Conditioning::Audio {
                    conditioning,
                    sample_size,
                    ..
                } => {
                    observed.seconds_total = Some(conditioning.seconds_total);
                    observed.sample_size = Some(sample_size);
                }
            }
        }

        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(self.output.clone()),
        }
    }
}

/// Loader that hands out one pre-built engine and counts calls.
pub struct SingleLoader {
    engine: RefCell<Option<Box<dyn InferenceEngine>>>,
    pub calls: Cell<usize>,
}

impl SingleLoader {
    pub fn new(engine: impl InferenceEngine + 'static) -> Self {
        Self {
            engine: RefCell::new(Some(Box::new(engine))),
            calls: Cell::new(0),
        }
    }
}

impl ModelLoader for SingleLoader {
    fn load(&self, model_id: &str) -> Result<Box<dyn InferenceEngine>> {
        self.calls.set(self.calls.get() + 1);
        self.engine
            .borrow_mut()
            .take()
            .ok_or_else(|| SynthError::model_not_found(model_id))
    }
}
