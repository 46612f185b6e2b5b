//! synthkit: one-shot generative pipelines behind a single CLI.
//!
//! Three pipelines share one straight-line shape:
//! resolve parameters, choose a placement, call an inference engine once,
//! normalize and persist the result.
//!
//! # Modules
//!
//! - [`resolve`]: raw CLI parameters into validated requests
//! - [`placement`]: staged offload vs full residency, hardware probing
//! - [`engine`]: the model loader and inference engine boundary
//! - [`generation`]: single-call invocation and the end-to-end pipelines
//! - [`output`]: image persister, waveform normalizer, WAV and sidecar writers
//! - [`config`]: environment configuration (AppConfig, Device)
//! - [`error`]: error types and codes (SynthError, ErrorCode)
//!
//! # Example
//!
//! ```rust,no_run
//! use synthkit::{
//!     config::AppConfig,
//!     engine::EngineRegistry,
//!     generation::{run, RunOptions},
//!     placement::SystemProbe,
//!     resolve::AudioParams,
//! };
//!
//! let config = AppConfig::from_env();
//! let params = AudioParams {
//!     prompt: Some("ambient drone".to_string()),
//!     duration: Some(5.0),
//!     model: Some("reference/audio".to_string()),
//!     ..Default::default()
//! };
//! let request = params.resolve(&config)?;
//! let loader = EngineRegistry::with_reference_engines(config.effective_model_dir());
//! let record = run(&request, &loader, &SystemProbe, RunOptions::default())?;
//! println!("{}", record.path.display());
//! # Ok::<(), synthkit::SynthError>(())
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod output;
pub mod placement;
pub mod resolve;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use config::{AppConfig, Device};
pub use error::{ErrorCode, Result, SynthError};
pub use types::{compute_fingerprint, ArtifactRecord, GenerationRequest, Modality};
