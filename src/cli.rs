//! Command-line interface.
//!
//! One subcommand per pipeline. All pipeline flags are optional at the
//! parser level; required values and defaults are enforced by the
//! [`resolve`](crate::resolve) layer so that missing input surfaces as a
//! `VALIDATION_ERROR` like every other failure.

use clap::{ArgAction, Parser, Subcommand};

use crate::resolve::{AudioParams, EditParams, ImageParams};

/// synthkit: one-shot image generation, image editing and audio generation
#[derive(Parser, Debug)]
#[command(name = "synthkit")]
#[command(about = "One-shot image generation, image editing and audio generation")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write a JSON metadata sidecar next to the artifact
    #[arg(long, global = true)]
    pub metadata: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline to run.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an image from a text prompt
    Image(ImageParams),
    /// Edit one or two input images with a text prompt
    Edit(EditParams),
    /// Generate audio from a text prompt
    Audio(AudioParams),
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Default log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Device;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("synthkit").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn image_flags() {
        let cli = parse(&[
            "image",
            "--prompt",
            "a red fox",
            "--negative_prompt",
            "blurry",
            "--guidance-scale",
            "4.5",
            "--seed",
            "7",
            "-o",
            "fox.png",
        ]);
        match cli.command {
            Command::Image(params) => {
                assert_eq!(params.prompt.as_deref(), Some("a red fox"));
                assert_eq!(params.negative_prompt.as_deref(), Some("blurry"));
                assert_eq!(params.guidance_scale, Some(4.5));
                assert_eq!(params.seed, Some(7));
                assert_eq!(params.output, Some(PathBuf::from("fox.png")));
                assert!(!params.full_residency);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn edit_accepts_use_cuda_alias() {
        let cli = parse(&["edit", "--image1", "bg.png", "--prompt", "snow", "--use_cuda"]);
        match cli.command {
            Command::Edit(params) => {
                assert!(params.full_residency);
                assert_eq!(params.image1, Some(PathBuf::from("bg.png")));
                assert!(params.image2.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn negative_steps_reach_the_resolver() {
        let cli = parse(&["audio", "--prompt", "hum", "--steps", "-5"]);
        match cli.command {
            Command::Audio(params) => assert_eq!(params.steps, Some(-5)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn negative_seed_reaches_the_resolver() {
        let cli = parse(&["image", "--prompt", "fox", "--seed", "-3"]);
        match cli.command {
            Command::Image(params) => {
                assert_eq!(params.seed, Some(-3));
                let err = params.resolve(&crate::config::AppConfig::new()).unwrap_err();
                assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn audio_device_and_sigmas() {
        let cli = parse(&[
            "audio", "-p", "rain", "--device", "cuda", "--sigma_min", "0.5", "--sigma-max", "400",
        ]);
        match cli.command {
            Command::Audio(params) => {
                assert_eq!(params.device, Some(Device::Cuda));
                assert_eq!(params.sigma_min, Some(0.5));
                assert_eq!(params.sigma_max, Some(400.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_device_rejected_by_parser() {
        let result = Cli::try_parse_from(["synthkit", "audio", "-p", "x", "--device", "tpu"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["image", "-p", "x", "-vv", "--metadata"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.metadata);
        assert_eq!(cli.log_level(), "debug");
        assert!(matches!(cli.command, Command::Image(_)));
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(parse(&["audio"]).log_level(), "warn");
        assert_eq!(parse(&["-v", "audio"]).log_level(), "info");
        assert_eq!(parse(&["-vvvv", "audio"]).log_level(), "trace");
    }
}
