//! Audio subsystem
//!
//! Sample formats and frames, sample conversion, the multi-plane ring
//! buffer, the resampling session, and WAV file I/O.

pub mod convert;
pub mod resampler;
pub mod ring_buffer;
pub mod types;
pub mod wav;

pub use resampler::{AudioResampler, ResamplerOptions};
pub use ring_buffer::PlanarRingBuffer;
pub use types::{AudioFormat, AudioFrame, SampleFormat};
