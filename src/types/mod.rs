//! Core types for synthkit.
//!
//! - [`GenerationRequest`]: a resolved, immutable request for one pipeline
//! - [`ArtifactRecord`]: what a pipeline reports after writing its file

mod artifact;
mod request;

pub use artifact::{compute_fingerprint, ArtifactRecord, AudioFacts};
pub use request::{AudioRequest, EditRequest, GenerationRequest, ImageRequest, Modality};
