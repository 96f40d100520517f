//! Integration tests for AudioResampler
//!
//! Feeds synthetic audio through whole resampling sessions and checks
//! frame sizes, sample counts and sample values.

use pcmring_ap::audio::convert::{from_interleaved_f32, from_planar_f32, to_planar_f32};
use pcmring_ap::{AudioFormat, AudioFrame, AudioResampler, ResamplerOptions, SampleFormat};

fn fmt(sample_format: SampleFormat, rate: u32, channels: u16) -> AudioFormat {
    AudioFormat::new(sample_format, rate, channels).unwrap()
}

/// Generate a sine wave as planar f32
fn sine(rate: u32, freq: f32, samples: usize, channels: usize) -> Vec<Vec<f32>> {
    let wave: Vec<f32> = (0..samples)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
        .collect();
    vec![wave; channels]
}

/// Split planar f32 into frames of varying size
fn chop(format: AudioFormat, planar: &[Vec<f32>], sizes: &[usize]) -> Vec<AudioFrame> {
    let total = planar[0].len();
    let mut frames = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while start < total {
        let end = (start + sizes[i % sizes.len()]).min(total);
        let part: Vec<Vec<f32>> = planar.iter().map(|c| c[start..end].to_vec()).collect();
        frames.push(from_planar_f32(format, &part).unwrap());
        start = end;
        i += 1;
    }
    frames
}

fn run(resampler: &mut AudioResampler, input: &[AudioFrame]) -> Vec<AudioFrame> {
    let mut out = Vec::new();
    for frame in input {
        out.extend(resampler.resample(frame).unwrap());
    }
    out.extend(resampler.flush().unwrap());
    out
}

#[test]
fn test_passthrough_reframes_arbitrary_chunks() {
    let format = fmt(SampleFormat::Flt, 48000, 2);
    let planar = sine(48000, 440.0, 5000, 2);
    let input = chop(format, &planar, &[1, 333, 1024, 7, 2000]);

    let mut resampler =
        AudioResampler::open(format, format, 480, ResamplerOptions::default()).unwrap();
    let output = run(&mut resampler, &input);

    // 10 full frames and one final 200-sample frame
    assert_eq!(output.len(), 11);
    assert!(output[..10].iter().all(|f| f.sample_count() == 480));
    assert_eq!(output[10].sample_count(), 200);

    let mut reassembled = vec![Vec::new(), Vec::new()];
    for frame in &output {
        for (c, channel) in to_planar_f32(frame).into_iter().enumerate() {
            reassembled[c].extend(channel);
        }
    }
    assert_eq!(reassembled, planar);
}

#[test]
fn test_interleaved_to_planar_conversion() {
    let src = fmt(SampleFormat::S16, 44100, 2);
    let dst = fmt(SampleFormat::Fltp, 44100, 2);

    let samples: Vec<f32> = (0..2048).map(|i| if i % 2 == 0 { 0.25 } else { -0.5 }).collect();
    let input = from_interleaved_f32(src, &samples).unwrap();

    let mut resampler = AudioResampler::open(src, dst, 256, ResamplerOptions::default()).unwrap();
    let output = run(&mut resampler, &[input]);

    assert_eq!(output.len(), 4);
    for frame in &output {
        assert_eq!(frame.plane_count(), 2);
        assert_eq!(frame.plane(0).unwrap().len(), 256 * 4);
        let planar = to_planar_f32(frame);
        assert!(planar[0].iter().all(|&s| (s - 0.25).abs() < 1e-4));
        assert!(planar[1].iter().all(|&s| (s + 0.5).abs() < 1e-4));
    }
}

#[test]
fn test_stereo_to_mono_downmix() {
    let src = fmt(SampleFormat::Fltp, 16000, 2);
    let dst = fmt(SampleFormat::Flt, 16000, 1);

    let input = from_planar_f32(src, &[vec![0.5; 100], vec![0.0; 100]]).unwrap();
    let mut resampler = AudioResampler::open(src, dst, 50, ResamplerOptions::default()).unwrap();
    let output = run(&mut resampler, &[input]);

    assert_eq!(output.len(), 2);
    assert!(output
        .iter()
        .flat_map(|f| to_planar_f32(f).remove(0))
        .all(|s| (s - 0.25).abs() < 1e-6));
}

#[test]
fn test_rate_conversion_sample_count() {
    let src = fmt(SampleFormat::Flt, 48000, 2);
    let dst = fmt(SampleFormat::S16p, 44100, 2);

    let input_samples = 48000;
    let input = chop(src, &sine(48000, 1000.0, input_samples, 2), &[4800]);

    let options = ResamplerOptions {
        ring_capacity_bytes: 64 * 1024,
        chunk_size: 1024,
    };
    let mut resampler = AudioResampler::open(src, dst, 1024, options).unwrap();
    let output = run(&mut resampler, &input);

    let full = &output[..output.len() - 1];
    assert!(full.iter().all(|f| f.sample_count() == 1024));

    let total: usize = output.iter().map(AudioFrame::sample_count).sum();
    assert_eq!(total, input_samples * 44100 / 48000);
    assert_eq!(resampler.buffered_samples(), 0);
    assert_eq!(resampler.pending_samples(), 0);
}

/// Resample a mono f32 signal 48k -> 44.1k and return the output samples
fn downsample_mono(signal: Vec<f32>, sizes: &[usize]) -> Vec<f32> {
    let src = fmt(SampleFormat::Flt, 48000, 1);
    let dst = fmt(SampleFormat::Flt, 44100, 1);

    let input = chop(src, &[signal], sizes);
    let mut resampler = AudioResampler::open(src, dst, 512, ResamplerOptions::default()).unwrap();
    let output = run(&mut resampler, &input);

    output.iter().flat_map(|f| to_planar_f32(f).remove(0)).collect()
}

#[test]
fn test_flush_drains_converter_delay() {
    // 48000 samples in 700-sample frames leaves a partial chunk for flush
    let samples = downsample_mono(vec![0.5; 48000], &[700]);
    assert_eq!(samples.len(), 44100);

    // Constant input stays constant away from the stream edges
    assert!(samples[16..samples.len() - 16]
        .iter()
        .all(|s| (s - 0.5).abs() < 1e-3));
}

#[test]
fn test_input_shorter_than_chunk_comes_out_on_flush() {
    let src = fmt(SampleFormat::Flt, 48000, 1);
    let dst = fmt(SampleFormat::Flt, 44100, 1);
    let mut resampler = AudioResampler::open(src, dst, 512, ResamplerOptions::default()).unwrap();

    let input = from_planar_f32(src, &[vec![0.5; 100]]).unwrap();
    assert!(resampler.resample(&input).unwrap().is_empty());

    let output = resampler.flush().unwrap();
    assert_eq!(output.len(), 1);
    // ceil(100 * 44100 / 48000)
    assert_eq!(output[0].sample_count(), 92);
}

#[test]
fn test_rate_conversion_keeps_timing() {
    // Silence then a step at input sample 1000 (output position ~918.75)
    let mut signal = vec![0.0; 1000];
    signal.extend(vec![0.5; 3000]);
    let samples = downsample_mono(signal, &[333, 1024]);

    let edge = samples.iter().position(|&s| s > 0.25).unwrap();
    assert!((916..=920).contains(&edge), "step found at {}", edge);
}

#[test]
fn test_upsampled_tone_keeps_amplitude() {
    let src = fmt(SampleFormat::Flt, 22050, 1);
    let dst = fmt(SampleFormat::Flt, 44100, 1);

    let input = chop(src, &sine(22050, 440.0, 22050, 1), &[2205]);
    let mut resampler = AudioResampler::open(src, dst, 4410, ResamplerOptions::default()).unwrap();
    let output = run(&mut resampler, &input);

    // Skip the converter's start-up delay
    let samples: Vec<f32> = output
        .iter()
        .flat_map(|f| to_planar_f32(f).remove(0))
        .skip(1000)
        .collect();
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!((peak - 0.5).abs() < 0.05, "peak {}", peak);
}

#[test]
fn test_session_is_reusable_after_flush() {
    let format = fmt(SampleFormat::S32, 8000, 1);
    let mut resampler =
        AudioResampler::open(format, format, 100, ResamplerOptions::default()).unwrap();

    let first = run(&mut resampler, &[AudioFrame::silent(format, 150)]);
    assert_eq!(first.iter().map(AudioFrame::sample_count).collect::<Vec<_>>(), vec![100, 50]);

    let second = run(&mut resampler, &[AudioFrame::silent(format, 100)]);
    assert_eq!(second.len(), 1);
    assert_eq!(resampler.frames_emitted(), 3);
}
