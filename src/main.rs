//! tensorbatch CLI - load images and normalize them into NCHW entries.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array3;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tensorbatch::{image, Config, ImageInput, Normalizer};

/// Output format for written entries.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Png,
    Jpg,
}

impl Format {
    const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

/// Normalize images into NCHW batch entries.
#[derive(Parser, Debug)]
#[command(name = "tensorbatch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image paths.
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Resize every image on load, e.g. 512x512.
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    size: Option<(u32, u32)>,

    /// Require this many channels in every entry.
    #[arg(long, value_name = "INT")]
    channels: Option<usize>,

    /// Write each normalized entry into this directory.
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Format of written entries.
    #[arg(long, value_enum, default_value = "png")]
    format: Format,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_size(value: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {value}"))?;
    let w = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok((w, h))
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tensorbatch={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let normalizer = Normalizer::new(Config {
        expected_channels: args.channels,
        allow_empty: false,
        ..Config::default()
    })
    .context("Invalid normalizer configuration")?;

    let images = args
        .inputs
        .iter()
        .map(|path| load(path, args.size))
        .collect::<Result<Vec<Array3<f32>>>>()?;

    let entries = normalizer
        .normalize(ImageInput::from(images))
        .context("Failed to normalize images")?;

    for (path, entry) in args.inputs.iter().zip(&entries) {
        println!("{} -> {:?}", path.display(), entry.shape());
    }

    if let Some(dir) = &args.output_dir {
        write_entries(dir, &args.inputs, &entries, args.format, args.quality)?;
    }

    Ok(())
}

fn load(path: &Path, size: Option<(u32, u32)>) -> Result<Array3<f32>> {
    let tensor = match size {
        Some(size) => image::load_image_resized(path, size),
        None => image::load_image(path),
    };
    tensor.with_context(|| format!("Failed to load {}", path.display()))
}

fn write_entries(
    dir: &Path,
    inputs: &[PathBuf],
    entries: &[image::ImageTensor],
    format: Format,
    quality: u8,
) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Writing [{bar:40.cyan/blue}] {pos}/{len}")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    for (i, (input, entry)) in inputs.iter().zip(entries).enumerate() {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let path = dir.join(format!("{stem}_{i}.{}", format.extension()));

        image::save_image(entry, &path, quality)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(())
}
