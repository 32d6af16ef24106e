use clap::Parser;
use mmlsynth::pipeline::{Pipeline, PipelineConfig};
use mmlsynth::wavetable::{Wavetable, DEFAULT_AMPLITUDE};
use plotters::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plot-wave")]
#[command(about = "Plot a wavetable and the start of a rendered MML score as SVG")]
struct Args {
    /// MML score, given inline (e.g. "o4 l8 c e g")
    score: String,

    /// Output SVG path
    #[arg(short, long, default_value = "wave.svg")]
    output: PathBuf,

    /// Wavetable text file (defaults to the built-in harmonic table)
    #[arg(short, long)]
    wavetable: Option<PathBuf>,

    /// Number of rendered samples to plot
    #[arg(short = 'n', long, default_value_t = 2000)]
    samples: usize,

    /// Output sample rate in Hz
    #[arg(short = 'r', long, default_value_t = 44100)]
    sample_rate: u32,
}

fn check_range(samples: &[i16], peak: i32) -> Result<(), Box<dyn std::error::Error>> {
    let clipped = samples
        .iter()
        .filter(|&&s| s == i16::MAX || s == i16::MIN)
        .count();
    if clipped > 0 {
        println!("  ! {} samples hit the 16-bit limit", clipped);
    } else {
        println!("  ✓ No clipping (wavetable peak {})", peak);
    }
    Ok(())
}

fn draw_series<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    title: &str,
    x_desc: &str,
    values: &[i16],
    color: &RGBColor,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let max_x = values.len().max(1) as i32;
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0i32..max_x, i32::from(i16::MIN)..i32::from(i16::MAX))?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Amplitude")
        .x_labels(10)
        .y_labels(9)
        .draw()?;

    chart.draw_series(LineSeries::new(
        values.iter().enumerate().map(|(i, &s)| (i as i32, i32::from(s))),
        color.stroke_width(1),
    ))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let wavetable = match &args.wavetable {
        Some(path) => Wavetable::load(path)?.scaled(DEFAULT_AMPLITUDE),
        None => Wavetable::default(),
    };

    println!("Waveform Plot Generator");
    println!("=======================");
    println!("  Score: {}", args.score);
    println!("  Wavetable: {} entries", wavetable.len());
    println!();

    let config = PipelineConfig {
        sample_rate: args.sample_rate,
        ..Default::default()
    };
    let pipeline = Pipeline::new(config, wavetable);

    print!("  Rendering score... ");
    let pcm = pipeline.render_score(&args.score)?;
    println!("done ({} samples)", pcm.len());
    if pcm.is_empty() {
        return Err("score produced no samples".into());
    }

    check_range(&pcm, pipeline.wavetable().peak())?;

    print!("  Creating plot... ");
    let root = SVGBackend::new(&args.output, (1000, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let (top, bottom) = root.split_vertically(300);

    draw_series(
        &top,
        "Wavetable (one cycle)",
        "Table index",
        pipeline.wavetable().as_slice(),
        &RED,
    )?;

    let shown = &pcm[..pcm.len().min(args.samples)];
    let title = format!("First {} samples at {} Hz", shown.len(), args.sample_rate);
    draw_series(&bottom, &title, "Sample", shown, &BLUE)?;

    root.present()?;
    println!("done");

    println!();
    println!("Output: {}", args.output.display());
    Ok(())
}
