//! # pcmring Audio Processing Library (pcmring-ap)
//!
//! Reframes resampled PCM audio into fixed-size output frames.
//!
//! **Architecture:** Byte planes flow through sample conversion and a rubato
//! rate converter into a multi-plane ring buffer, which is drained one output
//! frame at a time.
//!
//! ```text
//! AudioFrame → convert (to planar f32) → remix → rubato → convert (to output format)
//!                                                              ↓
//!                                                      PlanarRingBuffer (per plane)
//!                                                              ↓
//!                                                 fixed-size AudioFrame output
//! ```

pub mod audio;
pub mod error;

pub use audio::resampler::{AudioResampler, ResamplerOptions};
pub use audio::ring_buffer::PlanarRingBuffer;
pub use audio::types::{AudioFormat, AudioFrame, SampleFormat};
pub use error::{Error, Result};
