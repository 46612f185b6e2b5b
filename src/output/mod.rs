//! Output normalizer and persister.
//!
//! Turns a [`RawModelOutput`](crate::engine::RawModelOutput) into a file on
//! disk: images are saved as-is, waveforms are peak-normalized and written
//! as 16-bit PCM WAV. An optional JSON sidecar describes the artifact.

pub mod image;
pub mod sidecar;
pub mod wav;

pub use self::image::save_image;
pub use self::sidecar::{sidecar_path, write_sidecar};
pub use self::wav::{normalize_waveform, persist_waveform, write_wav_i16, PcmAudio};
