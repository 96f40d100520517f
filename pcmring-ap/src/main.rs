//! pcmring - Main entry point
//!
//! Resamples a WAV file into fixed-size output frames and writes the result
//! to a new WAV file.
//!
//! Settings priority: command-line arguments, then the TOML config file,
//! then built-in defaults.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use pcmring_ap::audio::wav::{read_wav, WavSink};
use pcmring_ap::{AudioFormat, AudioResampler, ResamplerOptions, SampleFormat};
use pcmring_common::logging::init_logging;
use pcmring_common::TomlConfig;
use tracing::{debug, info};

/// Command-line arguments for pcmring
#[derive(Parser, Debug)]
#[command(name = "pcmring")]
#[command(about = "Resample PCM audio into fixed-size frames")]
#[command(version)]
struct Args {
    /// Input WAV file
    #[arg(short, long)]
    input: PathBuf,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Output sample rate in Hz
    #[arg(short, long)]
    rate: Option<u32>,

    /// Output channel count
    #[arg(short, long)]
    channels: Option<u16>,

    /// Output sample format (u8, s16, s32, flt and planar variants u8p, s16p, s32p, fltp)
    #[arg(short, long)]
    format: Option<String>,

    /// Samples per channel in each output frame
    #[arg(long)]
    frame_samples: Option<usize>,

    /// Ring buffer capacity per plane in bytes
    #[arg(long)]
    ring_capacity: Option<usize>,

    /// Config file path (falls back to PCMRING_CONFIG, then the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::resolve_and_load(args.config.as_deref())
        .context("Failed to load configuration")?;
    init_logging(&config.logging);

    let sample_format: SampleFormat = args
        .format
        .as_deref()
        .unwrap_or(&config.output.sample_format)
        .parse()
        .context("Invalid output sample format")?;
    let frame_samples = args.frame_samples.unwrap_or(config.resampler.frame_samples);

    let mut options = ResamplerOptions::from(&config.resampler);
    if let Some(capacity) = args.ring_capacity {
        options.ring_capacity_bytes = capacity;
    }

    let started = Instant::now();

    let (src, input_frames) = read_wav(&args.input, config.resampler.chunk_size)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let dst = AudioFormat::new(
        sample_format,
        args.rate.unwrap_or(config.output.sample_rate),
        args.channels.unwrap_or(config.output.channels),
    )
    .context("Invalid output format")?;

    info!("Resampling {} ({}) -> {} ({})", args.input.display(), src, args.output.display(), dst);

    let mut resampler = AudioResampler::open(src, dst, frame_samples, options)
        .context("Failed to open resampler")?;
    let mut sink = WavSink::create(&args.output, dst)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    for frame in &input_frames {
        for out in resampler.resample(frame).context("Resampling failed")? {
            sink.write_frame(&out).context("Failed to write frame")?;
        }
        debug!("{} samples buffered", resampler.buffered_samples());
    }
    for out in resampler.flush().context("Failed to flush resampler")? {
        sink.write_frame(&out).context("Failed to write frame")?;
    }

    let samples = sink.samples_written();
    sink.finalize().context("Failed to finalize output")?;

    info!(
        "Wrote {} frames ({} samples, {:.2}s) in {:.2?}",
        resampler.frames_emitted(),
        samples,
        samples as f64 / dst.sample_rate as f64,
        started.elapsed()
    );

    Ok(())
}
