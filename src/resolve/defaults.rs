//! Fixed default tables, one per pipeline.

/// Text-to-image defaults.
pub mod image {
    /// Quality-exclusion phrase used when no negative prompt is given.
    pub const NEGATIVE_PROMPT: &str = "low quality, ugly, unfinished, out of focus, deformed, \
                                       disfigure, blurry, smudged, restricted palette, flat colors";
    pub const SEED: u64 = 433;
    pub const STEPS: i64 = 40;
    pub const GUIDANCE_SCALE: f32 = 3.0;
    pub const OUTPUT: &str = "chroma.png";
}

/// Image editing defaults.
pub mod edit {
    /// A single blank, read by the engine as "no negative guidance".
    pub const NEGATIVE_PROMPT: &str = " ";
    pub const SEED: u64 = 0;
    pub const STEPS: i64 = 30;
    pub const CFG_SCALE: f32 = 4.0;
    pub const OUTPUT: &str = "output_image_edit.png";
}

/// Text-to-audio defaults.
pub mod audio {
    pub const SEED: u64 = 0;
    pub const STEPS: i64 = 100;
    pub const CFG_SCALE: f32 = 7.0;
    pub const DURATION_SECONDS: f32 = 30.0;
    pub const SIGMA_MIN: f32 = 0.3;
    pub const SIGMA_MAX: f32 = 500.0;
    pub const SAMPLER: &str = "dpmpp-3m-sde";
    pub const OUTPUT: &str = "output.wav";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_phrase_is_one_line() {
        assert!(!image::NEGATIVE_PROMPT.contains('\n'));
        assert!(image::NEGATIVE_PROMPT.starts_with("low quality"));
        assert!(image::NEGATIVE_PROMPT.ends_with("flat colors"));
        assert!(image::NEGATIVE_PROMPT.contains("disfigure, blurry"));
    }

    #[test]
    fn edit_negative_is_single_blank() {
        assert_eq!(edit::NEGATIVE_PROMPT, " ");
    }
}
