//! CLI tool for rendering an MML score to a WAV file
//!
//! Usage: mmlsynth <input.mml> [-o output.wav] [-w wavetable.txt] [--save-wavetable out.txt]

use clap::Parser;
use mmlsynth::pipeline::{Pipeline, PipelineConfig};
use mmlsynth::wavetable::{Wavetable, DEFAULT_AMPLITUDE};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mmlsynth")]
#[command(version, about = "Render an MML score to a 16-bit WAV file", long_about = None)]
struct Cli {
    /// Path to the MML score
    input: PathBuf,

    /// Output WAV file path (defaults to <input>.wav)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Wavetable text file (whitespace-separated samples)
    #[arg(short, long)]
    wavetable: Option<PathBuf>,

    /// Rescale the loaded wavetable so its largest sample has this magnitude
    #[arg(long)]
    peak: Option<f64>,

    /// Also write the wavetable in use (after scaling) to this text file
    #[arg(long)]
    save_wavetable: Option<PathBuf>,

    /// Output sample rate in Hz
    #[arg(short = 'r', long, default_value_t = 44100)]
    sample_rate: u32,

    /// Samples rendered per generator call
    #[arg(long, default_value_t = 64)]
    frame_size: usize,
}

fn load_wavetable(cli: &Cli) -> Result<Wavetable, mmlsynth::Error> {
    let Some(path) = &cli.wavetable else {
        return Ok(Wavetable::default());
    };

    let table = Wavetable::load(path)?;
    // Editor tables use tiny ranges; scale them up unless told otherwise
    let peak = cli.peak.unwrap_or(DEFAULT_AMPLITUDE);
    Ok(table.scaled(peak))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("wav"));

    let score = fs::read_to_string(&cli.input)
        .map_err(|e| format!("cannot read {}: {}", cli.input.display(), e))?;
    let wavetable = load_wavetable(&cli)?;
    if let Some(path) = &cli.save_wavetable {
        wavetable.save(path)?;
        println!("Saved wavetable to {}", path.display());
    }

    let config = PipelineConfig {
        sample_rate: cli.sample_rate,
        frame_size: cli.frame_size,
        ..Default::default()
    };

    println!("Configuration:");
    println!("  Sample rate: {} Hz", config.sample_rate);
    println!("  Frame size: {} samples", config.frame_size);
    println!(
        "  Wavetable: {} entries, peak {}",
        wavetable.len(),
        wavetable.peak()
    );
    println!();

    let pipeline = Pipeline::new(config, wavetable);

    let events = pipeline.parse(&score)?;
    println!("Parsed {} events", events.len());

    let samples = pipeline.render(&events)?;
    mmlsynth::wav::write_wav_16bit(&output, &samples, cli.sample_rate)?;

    println!(
        "✓ Generated {} ({} samples, {:.2}s)",
        output.display(),
        samples.len(),
        samples.len() as f64 / f64::from(cli.sample_rate.max(1))
    );
    Ok(())
}
