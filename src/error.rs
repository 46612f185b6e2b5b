//! Error types for synthkit.
//!
//! Every failure a pipeline can hit is classified by an [`ErrorCode`] so the
//! process boundary can print one consistent diagnostic line.

use std::fmt;
use std::path::Path;

/// Error categories surfaced by the pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Bad or missing CLI input.
    /// Trigger: absent prompt, whitespace-only prompt, steps <= 0.
    ValidationError,

    /// A referenced input file is missing or cannot be decoded.
    /// Trigger: `--image1`/`--image2` path does not exist or is not an image.
    InputNotFound,

    /// Requested accelerator is absent; execution degrades to the host.
    /// Trigger: full residency or a GPU device requested on a host without one.
    DeviceUnavailable,

    /// Accelerator memory is insufficient for the requested placement.
    /// Trigger: full residency forced on a small GPU.
    ResourceExhausted,

    /// The inference engine rejected or failed the request.
    /// Trigger: out-of-range numeric knob, unknown sampler, internal failure.
    EngineError,

    /// The engine produced a silent or non-finite waveform.
    /// Trigger: peak absolute sample is zero.
    DegenerateOutput,

    /// The artifact could not be written.
    /// Trigger: missing directory, permissions, unsupported extension.
    FilesystemError,

    /// No engine is registered for the requested model id.
    ModelNotFound,

    /// The engine factory failed while loading the model.
    ModelLoadFailed,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InputNotFound => "INPUT_NOT_FOUND",
            ErrorCode::DeviceUnavailable => "DEVICE_UNAVAILABLE",
            ErrorCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            ErrorCode::EngineError => "ENGINE_ERROR",
            ErrorCode::DegenerateOutput => "DEGENERATE_OUTPUT",
            ErrorCode::FilesystemError => "FILESYSTEM_ERROR",
            ErrorCode::ModelNotFound => "MODEL_NOT_FOUND",
            ErrorCode::ModelLoadFailed => "MODEL_LOAD_FAILED",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "Invalid or missing command-line input",
            ErrorCode::InputNotFound => "Referenced input file is missing or unreadable",
            ErrorCode::DeviceUnavailable => "Requested accelerator is not available",
            ErrorCode::ResourceExhausted => "Not enough accelerator memory for the requested placement",
            ErrorCode::EngineError => "The inference engine failed",
            ErrorCode::DegenerateOutput => "The engine produced a silent waveform",
            ErrorCode::FilesystemError => "The artifact could not be written",
            ErrorCode::ModelNotFound => "No engine is registered for the model id",
            ErrorCode::ModelLoadFailed => "Failed to load the model",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => {
                "Check the flags passed (see --help); prompts must be non-empty and steps > 0"
            }
            ErrorCode::InputNotFound => "Verify the input image path exists and is a readable image",
            ErrorCode::DeviceUnavailable => {
                "Execution continues on the host; install GPU drivers or pass --device cpu to silence this"
            }
            ErrorCode::ResourceExhausted => {
                "Drop the full-residency flag to use staged offload, or free accelerator memory"
            }
            ErrorCode::EngineError => {
                "Check numeric knobs (guidance, sigma bounds, sampler) against the model's valid ranges"
            }
            ErrorCode::DegenerateOutput => "Try a different seed or prompt",
            ErrorCode::FilesystemError => {
                "Check that the output directory exists, is writable, and the extension is supported"
            }
            ErrorCode::ModelNotFound => {
                "Pass --model with a registered id (reference/image, reference/edit, reference/audio) \
                 or register an engine through the library API"
            }
            ErrorCode::ModelLoadFailed => {
                "Verify the model files under the model directory (SYNTHKIT_MODEL_DIR) are complete"
            }
        }
    }

    /// Returns true if this category terminates the invocation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ErrorCode::DeviceUnavailable | ErrorCode::DegenerateOutput)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for synthkit operations.
#[derive(Debug)]
pub struct SynthError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SynthError {
    /// Creates a new SynthError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new SynthError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a VALIDATION_ERROR for a required field that was not given.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::ValidationError,
            format!("Missing required parameter: {}", field),
        )
    }

    /// Creates a VALIDATION_ERROR for a prompt with no content.
    pub fn empty_prompt(field: &str) -> Self {
        Self::new(
            ErrorCode::ValidationError,
            format!("{} cannot be empty", field),
        )
    }

    /// Creates a VALIDATION_ERROR for a non-positive step count.
    pub fn invalid_steps(steps: i64) -> Self {
        Self::new(
            ErrorCode::ValidationError,
            format!("Invalid step count: {} (must be > 0)", steps),
        )
    }

    /// Creates a VALIDATION_ERROR for a negative seed.
    pub fn invalid_seed(seed: i64) -> Self {
        Self::new(
            ErrorCode::ValidationError,
            format!("Invalid seed: {} (must be >= 0)", seed),
        )
    }

    /// Creates a VALIDATION_ERROR for an unusable audio duration.
    pub fn invalid_duration(duration: f64) -> Self {
        Self::new(
            ErrorCode::ValidationError,
            format!("Invalid duration: {} seconds (must be > 0)", duration),
        )
    }

    /// Creates an INPUT_NOT_FOUND error.
    pub fn input_not_found(path: &Path) -> Self {
        Self::new(
            ErrorCode::InputNotFound,
            format!("Input image not found: {}", path.display()),
        )
    }

    /// Creates an INPUT_NOT_FOUND error for a file that exists but cannot be decoded.
    pub fn input_unreadable(
        path: &Path,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::with_source(
            ErrorCode::InputNotFound,
            format!("Input image could not be decoded: {}", path.display()),
            source,
        )
    }

    /// Creates a DEVICE_UNAVAILABLE warning.
    pub fn device_unavailable(requested: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DeviceUnavailable,
            format!(
                "Requested accelerator '{}' is not available, falling back to host execution",
                requested.into()
            ),
        )
    }

    /// Creates a RESOURCE_EXHAUSTED error.
    pub fn resource_exhausted(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceExhausted, reason.into())
    }

    /// Creates an ENGINE_ERROR.
    pub fn engine(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::EngineError,
            format!("Inference failed: {}", reason.into()),
        )
    }

    /// Creates a DEGENERATE_OUTPUT warning.
    pub fn degenerate_output(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::DegenerateOutput, reason.into())
    }

    /// Creates a FILESYSTEM_ERROR for a failed artifact write.
    pub fn write_failed(
        path: &Path,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::with_source(
            ErrorCode::FilesystemError,
            format!("Failed to write {}: {}", path.display(), source),
            source,
        )
    }

    /// Creates a MODEL_NOT_FOUND error.
    pub fn model_not_found(model_id: &str) -> Self {
        Self::new(
            ErrorCode::ModelNotFound,
            format!("No engine registered for model '{}'", model_id),
        )
    }

    /// Creates a MODEL_LOAD_FAILED error.
    pub fn model_load_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ModelLoadFailed,
            format!("Failed to load model: {}", reason.into()),
        )
    }
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for SynthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using SynthError.
pub type Result<T> = std::result::Result<T, SynthError>;
