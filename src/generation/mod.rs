//! Generation pipelines.
//!
//! [`invoke`] wraps the single engine call; [`pipeline`] chains it with
//! model loading, placement and persistence.

pub mod invoke;
pub mod pipeline;

pub use invoke::{invoke, load_reference_images};
pub use pipeline::{run, run_audio, run_edit, run_image, RunOptions};
