//! End-to-end pipelines.
//!
//! Each run is one straight line: validate inputs, load the model, pick a
//! placement, invoke the engine once, persist the artifact, and optionally
//! write the metadata sidecar. Any fatal error stops the line; nothing is
//! written unless generation succeeded.

use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::engine::{ModelLoader, RawModelOutput};
use crate::error::{Result, SynthError};
use crate::output::{persist_waveform, save_image, write_sidecar};
use crate::placement::{select_placement, HardwareProbe, PlacementIntent};
use crate::types::{ArtifactRecord, AudioRequest, EditRequest, GenerationRequest, ImageRequest};

use super::invoke::{invoke, load_reference_images};

/// Switches that affect what a run writes, not what it generates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Write `<output>.json` next to the artifact.
    pub metadata: bool,
}

/// Runs text-to-image generation.
pub fn run_image(
    request: &ImageRequest,
    loader: &dyn ModelLoader,
    probe: &dyn HardwareProbe,
    options: RunOptions,
) -> Result<ArtifactRecord> {
    run(&GenerationRequest::Image(request.clone()), loader, probe, options)
}

/// Runs image editing.
pub fn run_edit(
    request: &EditRequest,
    loader: &dyn ModelLoader,
    probe: &dyn HardwareProbe,
    options: RunOptions,
) -> Result<ArtifactRecord> {
    run(&GenerationRequest::Edit(request.clone()), loader, probe, options)
}

/// Runs text-to-audio generation.
pub fn run_audio(
    request: &AudioRequest,
    loader: &dyn ModelLoader,
    probe: &dyn HardwareProbe,
    options: RunOptions,
) -> Result<ArtifactRecord> {
    run(&GenerationRequest::Audio(request.clone()), loader, probe, options)
}

/// Runs any resolved request and returns the record of the written artifact.
#[instrument(
    skip_all,
    fields(modality = %request.modality(), model = request.model_id(), seed = request.seed())
)]
pub fn run(
    request: &GenerationRequest,
    loader: &dyn ModelLoader,
    probe: &dyn HardwareProbe,
    options: RunOptions,
) -> Result<ArtifactRecord> {
    let images = match request {
        GenerationRequest::Edit(r) => load_reference_images(&r.reference_images)?,
        _ => Vec::new(),
    };

    let mut engine = loader.load(request.model_id())?;
    tracing::info!(model = engine.metadata().model_id.as_str(), "model loaded");

    let decision = select_placement(PlacementIntent::from_request(request), probe);
    let output = invoke(engine.as_mut(), request, &images, decision.plan)?;

    let path = request.output();
    let audio = match output {
        RawModelOutput::Images(images) => {
            let (width, height) = save_image(&images, path)?;
            tracing::info!(width, height, "image saved");
            None
        }
        RawModelOutput::Waveform(waveform) => {
            let metadata = engine.metadata().audio.ok_or_else(|| {
                SynthError::engine("audio model reports no sample rate")
            })?;
            let facts = persist_waveform(&waveform, &metadata, path)?;
            tracing::info!(
                frames = facts.frames,
                duration_sec = facts.duration_sec(),
                "audio saved"
            );
            Some(facts)
        }
    };

    let record = ArtifactRecord::new(request, absolute(path), audio);
    if options.metadata {
        write_sidecar(&record)?;
    }

    Ok(record)
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
