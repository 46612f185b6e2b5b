//! synthkit: one-shot image generation, image editing and audio generation.
//!
//! Each invocation resolves one request, runs it through the matching
//! pipeline and exits. Diagnostics go to stderr; stdout carries only the
//! saved path.

use std::time::Instant;

use tracing_subscriber::EnvFilter;

use synthkit::cli::{Cli, Command};
use synthkit::config::AppConfig;
use synthkit::engine::EngineRegistry;
use synthkit::error::Result;
use synthkit::generation::{run, RunOptions};
use synthkit::placement::SystemProbe;
use synthkit::types::GenerationRequest;

fn main() {
    let cli = Cli::parse_args();
    init_logging(&cli);

    if let Err(e) = run_cli(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Installs the stderr subscriber. `RUST_LOG` overrides `-v`.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_cli(cli: &Cli) -> Result<()> {
    let config = AppConfig::from_env();
    let request = match &cli.command {
        Command::Image(params) => params.resolve(&config)?,
        Command::Edit(params) => params.resolve(&config)?,
        Command::Audio(params) => params.resolve(&config)?,
    };

    print_banner(&request);

    let loader = EngineRegistry::with_reference_engines(config.effective_model_dir());
    let options = RunOptions {
        metadata: cli.metadata,
    };

    let start_time = Instant::now();
    let record = run(&request, &loader, &SystemProbe, options)?;

    eprintln!();
    eprintln!("Generation complete!");
    eprintln!("  Time: {:.2}s", start_time.elapsed().as_secs_f32());
    if let Some(audio) = &record.audio {
        eprintln!("  Audio duration: {:.2}s", audio.duration_sec());
    }
    eprintln!("  Fingerprint: {}", record.fingerprint);
    eprintln!();

    println!("Saved to: {}", record.path.display());
    Ok(())
}

fn print_banner(request: &GenerationRequest) {
    eprintln!("=== synthkit {} ===", request.modality());
    eprintln!("Model: {}", request.model_id());
    eprintln!("Prompt: \"{}\"", request.prompt());
    match request {
        GenerationRequest::Edit(r) => {
            for (i, path) in r.reference_images.iter().enumerate() {
                eprintln!("Image {}: {}", i + 1, path.display());
            }
        }
        GenerationRequest::Audio(r) => {
            eprintln!("Duration: {}s", r.duration_seconds);
            eprintln!("Sampler: {}", r.sampler);
        }
        GenerationRequest::Image(_) => {}
    }
    eprintln!("Steps: {}", request.steps());
    eprintln!("Seed: {}", request.seed());
    eprintln!("Output: {}", request.output().display());
    eprintln!();
}
