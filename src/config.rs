//! Runtime configuration.
//!
//! Holds the ambient settings for a synthkit invocation: which device the
//! user prefers, where model weights live, and which engine serves each
//! modality by default. Request knobs (steps, guidance, seeds) are never
//! read from the environment; their defaults live in [`crate::resolve`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::reference;
use crate::types::Modality;

/// Default engine for text-to-image.
pub const DEFAULT_IMAGE_MODEL: &str = reference::IMAGE_MODEL_ID;

/// Default engine for image editing.
pub const DEFAULT_EDIT_MODEL: &str = reference::EDIT_MODEL_ID;

/// Default engine for text-to-audio.
pub const DEFAULT_AUDIO_MODEL: &str = reference::AUDIO_MODEL_ID;

/// Execution device preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Probe the host and use an accelerator if one is present.
    #[default]
    Auto,

    /// Force host execution.
    Cpu,

    /// NVIDIA GPU.
    Cuda,

    /// Apple Silicon GPU.
    Metal,
}

impl Device {
    /// Returns the string representation of the device.
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::Metal => "metal",
        }
    }

    /// Parses a device from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Device::Auto),
            "cpu" => Some(Device::Cpu),
            "cuda" | "gpu" => Some(Device::Cuda),
            "metal" | "mps" => Some(Device::Metal),
            _ => None,
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ambient configuration for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Device preference used when a pipeline has no explicit device flag.
    pub device: Device,

    /// Root directory holding model weights, one subdirectory per model id.
    /// If None, uses the platform-specific cache location.
    pub model_dir: Option<PathBuf>,

    /// Engine used by `synthkit image` when `--model` is absent.
    pub image_model: String,

    /// Engine used by `synthkit edit` when `--model` is absent.
    pub edit_model: String,

    /// Engine used by `synthkit audio` when `--model` is absent.
    pub audio_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: Device::Auto,
            model_dir: None,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            audio_model: DEFAULT_AUDIO_MODEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Creates an AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an AppConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `SYNTHKIT_DEVICE` - Device preference (auto, cpu, cuda, metal)
    /// - `SYNTHKIT_MODEL_DIR` - Root directory for model weights
    /// - `SYNTHKIT_IMAGE_MODEL` - Default text-to-image engine id
    /// - `SYNTHKIT_EDIT_MODEL` - Default image editing engine id
    /// - `SYNTHKIT_AUDIO_MODEL` - Default text-to-audio engine id
    ///
    /// Unset or invalid variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(device_str) = lookup("SYNTHKIT_DEVICE") {
            match Device::parse(&device_str) {
                Some(device) => config.device = device,
                None => tracing::warn!(value = %device_str, "ignoring unknown SYNTHKIT_DEVICE"),
            }
        }

        if let Some(path) = lookup("SYNTHKIT_MODEL_DIR") {
            if !path.trim().is_empty() {
                config.model_dir = Some(PathBuf::from(path));
            }
        }

        for (key, slot) in [
            ("SYNTHKIT_IMAGE_MODEL", &mut config.image_model),
            ("SYNTHKIT_EDIT_MODEL", &mut config.edit_model),
            ("SYNTHKIT_AUDIO_MODEL", &mut config.audio_model),
        ] {
            if let Some(id) = lookup(key) {
                let id = id.trim();
                if id.is_empty() {
                    tracing::warn!(key, "ignoring empty model id");
                } else {
                    *slot = id.to_string();
                }
            }
        }

        config
    }

    /// Returns the default engine id for a modality.
    pub fn model_for(&self, modality: Modality) -> &str {
        match modality {
            Modality::Image => &self.image_model,
            Modality::Edit => &self.edit_model,
            Modality::Audio => &self.audio_model,
        }
    }

    /// Returns the effective model root, using platform defaults if not specified.
    pub fn effective_model_dir(&self) -> PathBuf {
        if let Some(ref path) = self.model_dir {
            path.clone()
        } else {
            default_model_dir()
        }
    }
}

/// Returns the platform-specific default model storage path.
///
/// - macOS: ~/Library/Caches/synthkit/models
/// - Linux: ~/.cache/synthkit/models
/// - Windows: C:\Users\<user>\AppData\Local\synthkit\cache\models
fn default_model_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "synthkit") {
        proj_dirs.cache_dir().join("models")
    } else {
        PathBuf::from("./models")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn device_parsing() {
        assert_eq!(Device::parse("auto"), Some(Device::Auto));
        assert_eq!(Device::parse("CPU"), Some(Device::Cpu));
        assert_eq!(Device::parse("cuda"), Some(Device::Cuda));
        assert_eq!(Device::parse("mps"), Some(Device::Metal));
        assert_eq!(Device::parse("tpu"), None);
    }

    #[test]
    fn defaults_without_env() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.device, Device::Auto);
        assert_eq!(config.model_for(Modality::Image), DEFAULT_IMAGE_MODEL);
        assert_eq!(config.model_for(Modality::Edit), DEFAULT_EDIT_MODEL);
        assert_eq!(config.model_for(Modality::Audio), DEFAULT_AUDIO_MODEL);
        assert!(config.model_dir.is_none());
    }

    #[test]
    fn default_models_are_registered() {
        let registry = crate::engine::EngineRegistry::with_reference_engines("/tmp/models");
        let ids: Vec<&str> = registry.model_ids().collect();
        for default in [DEFAULT_IMAGE_MODEL, DEFAULT_EDIT_MODEL, DEFAULT_AUDIO_MODEL] {
            assert!(ids.contains(&default), "{} is not registered", default);
        }
    }

    #[test]
    fn env_overrides_apply() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SYNTHKIT_DEVICE", "cpu"),
            ("SYNTHKIT_MODEL_DIR", "/srv/models"),
            ("SYNTHKIT_AUDIO_MODEL", "acme/drone-synth"),
        ]));
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.effective_model_dir(), PathBuf::from("/srv/models"));
        assert_eq!(config.model_for(Modality::Audio), "acme/drone-synth");
        assert_eq!(config.model_for(Modality::Image), DEFAULT_IMAGE_MODEL);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SYNTHKIT_DEVICE", "quantum"),
            ("SYNTHKIT_EDIT_MODEL", "   "),
        ]));
        assert_eq!(config.device, Device::Auto);
        assert_eq!(config.edit_model, DEFAULT_EDIT_MODEL);
    }

    #[test]
    fn default_model_dir_is_valid() {
        let path = AppConfig::new().effective_model_dir();
        assert!(!path.as_os_str().is_empty());
    }
}
