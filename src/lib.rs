//! Audio-reactive control signals for generative visuals.
//!
//! The crate has two halves. The audio pipeline ingests live PCM into a
//! [`audio::SampleBuffer`], drains it once per frame, and derives scalar
//! control signals (power, energy, per-band levels, beat phase) in
//! [`audio::FeatureState`] and [`audio::BeatEstimator`]. The effect scheduler
//! ([`effects::PresetBlender`]) keeps several visual presets alive at once,
//! crossfading between them so exactly one remains durably visible while the
//! others retire. Rendering itself stays behind the [`effects::Surface`] and
//! [`effects::Compositor`] traits.

pub mod audio;
pub mod debug;
pub mod effects;
pub mod signal;
