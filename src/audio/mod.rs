pub mod beat;
pub mod capture;
pub mod features;
pub mod filter;
pub mod sample_buffer;

pub use beat::BeatEstimator;
pub use capture::{AudioCapture, CaptureEvent};
pub use features::{FeatureConfig, FeatureState};
pub use filter::{iir_band_filter, BandFilterKind, Filter, FirFilter, IirFilter};
pub use sample_buffer::SampleBuffer;

/// Layout of a PCM sample batch handed to `SampleBuffer::add_pcm_samples`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmFormat {
    Mono,
    StereoInterleaved,
}
