//! ArtifactRecord describing a written artifact.
//!
//! The record is what a pipeline reports once its file is on disk. It is
//! identified by a fingerprint of the reproducibility-relevant request
//! fields, so two records with equal fingerprints describe runs that must
//! produce identical bytes on the same engine.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use super::request::{GenerationRequest, Modality};

/// Audio facts recorded for WAV artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFacts {
    /// Native sample rate reported by the engine.
    pub sample_rate: u32,
    /// Channel count of the written file.
    pub channels: u16,
    /// Number of frames (samples per channel).
    pub frames: usize,
    /// True when the engine returned silence and zeros were written.
    pub degenerate: bool,
}

impl AudioFacts {
    /// Returns the duration of the written audio in seconds.
    pub fn duration_sec(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f32 / self.sample_rate as f32
    }
}

/// A successfully written artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// 16 hex characters of SHA256 over the request's reproducibility fields.
    pub fingerprint: String,

    /// Where the artifact was written.
    pub path: PathBuf,

    /// Pipeline that produced it.
    pub modality: Modality,

    /// Engine id that produced it.
    pub model_id: String,

    /// Seed the random source was initialized with.
    pub seed: u64,

    /// Present for audio artifacts only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioFacts>,

    /// The resolved request, for reproducing the run.
    pub request: GenerationRequest,
}

impl ArtifactRecord {
    /// Creates a record for a request whose artifact was written to `path`.
    pub fn new(request: &GenerationRequest, path: PathBuf, audio: Option<AudioFacts>) -> Self {
        Self {
            fingerprint: compute_fingerprint(request),
            path,
            modality: request.modality(),
            model_id: request.model_id().to_string(),
            seed: request.seed(),
            audio,
            request: request.clone(),
        }
    }
}

/// Computes a deterministic fingerprint from the fields that drive generation.
///
/// The output path is excluded: writing the same run elsewhere does not
/// change what is generated.
pub fn compute_fingerprint(request: &GenerationRequest) -> String {
    let mut input = format!(
        "{}:{}:{}:{}:{}:{}:{}",
        request.modality(),
        request.model_id(),
        request.prompt(),
        request.negative_prompt(),
        request.seed(),
        request.steps(),
        request.guidance_scale()
    );

    // Placement changes where compute runs, never what it produces.
    match request {
        GenerationRequest::Image(_) => {}
        GenerationRequest::Edit(r) => {
            for path in &r.reference_images {
                input.push_str(&format!(":{}", path.display()));
            }
        }
        GenerationRequest::Audio(r) => {
            input.push_str(&format!(
                ":{}:{}:{}:{}",
                r.duration_seconds, r.sigma_min, r.sigma_max, r.sampler
            ));
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageRequest;

    fn image(seed: u64, output: &str) -> GenerationRequest {
        GenerationRequest::Image(ImageRequest {
            model_id: "reference/image".to_string(),
            prompt: "a lighthouse at dusk".to_string(),
            negative_prompt: "blurry".to_string(),
            seed,
            steps: 40,
            guidance_scale: 3.0,
            full_residency: false,
            output: PathBuf::from(output),
        })
    }

    #[test]
    fn fingerprint_format() {
        let id = compute_fingerprint(&image(433, "a.png"));
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_ignores_output_path() {
        assert_eq!(
            compute_fingerprint(&image(433, "a.png")),
            compute_fingerprint(&image(433, "elsewhere/b.png"))
        );
    }

    #[test]
    fn fingerprint_tracks_seed() {
        assert_ne!(
            compute_fingerprint(&image(433, "a.png")),
            compute_fingerprint(&image(434, "a.png"))
        );
    }

    #[test]
    fn fingerprint_ignores_placement() {
        let staged = image(433, "a.png");
        let mut resident = staged.clone();
        if let GenerationRequest::Image(r) = &mut resident {
            r.full_residency = true;
        }
        assert_eq!(compute_fingerprint(&staged), compute_fingerprint(&resident));
    }

    #[test]
    fn audio_duration() {
        let facts = AudioFacts {
            sample_rate: 44_100,
            channels: 2,
            frames: 220_500,
            degenerate: false,
        };
        assert_eq!(facts.duration_sec(), 5.0);
    }
}
