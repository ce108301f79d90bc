use serde::{Deserialize, Serialize};

use super::filter::{iir_band_filter, BandFilterKind, Filter, IirFilter};
use crate::signal::{Accumulator, Unitizer};

/// Number of fixed frequency bands tracked per channel.
pub const NUM_FILTER_BANDS: usize = 3;

const NUM_CHANNELS: usize = 2;

/// Band edges in Hz: bass, mid, treble.
const FILTER_BAND_EDGES: [(f32, f32); NUM_FILTER_BANDS] =
    [(20.0, 300.0), (300.0, 4000.0), (4000.0, 15000.0)];

/// Decay factor for updating the average power. Average power is computed by
/// a first-order low-pass filter of the current signal power.
const POWER_UPDATE_ALPHA: f32 = 0.99;

/// Decay factor for initializing the average power. Significantly less than
/// 1, so the warm-up estimate converges to the order of magnitude of the
/// signal power within the warm-up window.
const POWER_INITIALIZATION_ALPHA: f32 = 0.8;

/// Number of updates fed to the fast warm-up filter before its output seeds
/// `average_power` and the slow filter takes over.
const WARMUP_UPDATES: u32 = 100;

/// Very small floating point value.
const EPSILON: f32 = 1e-12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Sampling rate of the incoming audio, in Hz. Band filter coefficients
    /// are normalized against it at construction.
    pub sampling_rate: u32,

    /// Optional upper bound applied to `dt` before it reaches any
    /// accumulator. A stalled frame otherwise injects its full wall-clock gap
    /// into energy and band-energy integrals in a single step.
    pub max_dt: Option<f32>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 44100,
            max_dt: None,
        }
    }
}

/// Per-frame audio feature aggregation: instantaneous and average power,
/// energy integrals, per-channel band powers, and unitized relative-loudness
/// signals, all derived from drained interleaved stereo sample batches.
///
/// Single-threaded by design; only the render thread calls `update`.
pub struct FeatureState {
    config: FeatureConfig,

    dt: f32,
    time: f32,
    power: f32,
    average_power: f32,
    energy: Accumulator,
    normalized_energy: Accumulator,

    normalized_energy_initialized: bool,
    warmup_filter: IirFilter,
    warmup_updates: u32,
    average_power_filter: IirFilter,

    channels: [Vec<f32>; NUM_CHANNELS],
    channel_band_filters: [[IirFilter; NUM_FILTER_BANDS]; NUM_CHANNELS],
    channel_bands: [[f32; NUM_FILTER_BANDS]; NUM_CHANNELS],
    channel_bands_energy: [[f32; NUM_FILTER_BANDS]; NUM_CHANNELS],

    band_unitizers: [Unitizer; NUM_FILTER_BANDS],
    bands_u: [f32; NUM_FILTER_BANDS],
}

impl FeatureState {
    pub fn new(config: FeatureConfig) -> Self {
        let sampling_rate = config.sampling_rate as f32;
        let band_filter = |band: usize| {
            let (low, high) = FILTER_BAND_EDGES[band];
            let center = (low + high) / 2.0;
            let bandwidth = (high - low).abs();
            iir_band_filter(
                center / sampling_rate,
                bandwidth / sampling_rate,
                BandFilterKind::Bandpass,
            )
        };

        Self {
            config,
            dt: 0.0,
            time: 0.0,
            power: 0.0,
            average_power: 0.0,
            energy: Accumulator::new(),
            normalized_energy: Accumulator::new(),
            normalized_energy_initialized: false,
            warmup_filter: IirFilter::low_pass(POWER_INITIALIZATION_ALPHA),
            warmup_updates: 0,
            average_power_filter: IirFilter::low_pass(POWER_UPDATE_ALPHA),
            channels: Default::default(),
            channel_band_filters: [
                [band_filter(0), band_filter(1), band_filter(2)],
                [band_filter(0), band_filter(1), band_filter(2)],
            ],
            channel_bands: Default::default(),
            channel_bands_energy: Default::default(),
            band_unitizers: Default::default(),
            bands_u: Default::default(),
        }
    }

    /// Folds one drained batch of interleaved stereo samples into the feature
    /// set. `dt` is the elapsed wall-clock time, in seconds, since the
    /// previous call.
    pub fn update(&mut self, samples: &[f32], dt: f32) {
        let dt = match self.config.max_dt {
            Some(max_dt) => dt.min(max_dt),
            None => dt,
        };
        self.dt = dt;
        self.time += dt;

        let frames = samples.len() / NUM_CHANNELS;
        if frames != self.channels[0].len() {
            self.channels[0].resize(frames, 0.0);
            self.channels[1].resize(frames, 0.0);
        }

        // The buffer holds interleaved samples. Computing power as if it were
        // mono has the same outcome as averaging the power of the left and
        // right channels independently.
        self.power = 0.0;
        for (i, &sample) in samples.iter().enumerate() {
            self.channels[i % 2][i / 2] = sample;
            self.power += sample * sample;
        }
        if !samples.is_empty() {
            self.power /= samples.len() as f32;
        }

        for channel in 0..NUM_CHANNELS {
            for band in 0..NUM_FILTER_BANDS {
                let value =
                    self.channel_band_filters[channel][band].compute_power(&self.channels[channel]);
                // NaN during filter warm-up must not corrupt the band energy.
                if value.is_nan() {
                    continue;
                }
                self.channel_bands[channel][band] = value;
                self.channel_bands_energy[channel][band] += value * dt;
            }
        }

        for band in 0..NUM_FILTER_BANDS {
            let summed = self.channel_bands[0][band] + self.channel_bands[1][band];
            self.bands_u[band] = self.band_unitizers[band].update(summed);
        }

        self.energy += self.power * dt;

        if self.warmup_updates < WARMUP_UPDATES {
            self.warmup_updates += 1;
            let out_sample = self.warmup_filter.process_sample(self.power);
            if self.warmup_updates == WARMUP_UPDATES {
                self.average_power = out_sample;
            }
        } else {
            self.average_power = self.average_power_filter.process_sample(self.power);
        }

        // Wait for the average power to rise beyond epsilon before starting
        // to accumulate normalized energy.
        if self.normalized_energy_initialized || self.average_power.abs() >= EPSILON {
            self.normalized_energy_initialized = true;
            if self.average_power != 0.0 {
                self.normalized_energy += self.power / self.average_power;
            }
        }
    }

    pub fn t(&self) -> f32 {
        self.time
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn average_power(&self) -> f32 {
        self.average_power
    }

    pub fn energy(&self) -> &Accumulator {
        &self.energy
    }

    pub fn normalized_energy(&self) -> &Accumulator {
        &self.normalized_energy
    }

    pub fn left_channel(&self) -> &[f32] {
        &self.channels[0]
    }

    pub fn right_channel(&self) -> &[f32] {
        &self.channels[1]
    }

    pub fn bass_left(&self) -> f32 {
        self.channel_bands[0][0]
    }

    pub fn bass_right(&self) -> f32 {
        self.channel_bands[1][0]
    }

    pub fn mid_left(&self) -> f32 {
        self.channel_bands[0][1]
    }

    pub fn mid_right(&self) -> f32 {
        self.channel_bands[1][1]
    }

    pub fn treble_left(&self) -> f32 {
        self.channel_bands[0][2]
    }

    pub fn treble_right(&self) -> f32 {
        self.channel_bands[1][2]
    }

    pub fn bass(&self) -> f32 {
        self.bass_left() + self.bass_right()
    }

    pub fn mid(&self) -> f32 {
        self.mid_left() + self.mid_right()
    }

    pub fn treble(&self) -> f32 {
        self.treble_left() + self.treble_right()
    }

    pub fn bass_u(&self) -> f32 {
        self.bands_u[0]
    }

    pub fn mid_u(&self) -> f32 {
        self.bands_u[1]
    }

    pub fn treble_u(&self) -> f32 {
        self.bands_u[2]
    }

    pub fn bass_energy(&self) -> f32 {
        self.channel_bands_energy[0][0] + self.channel_bands_energy[1][0]
    }

    pub fn mid_energy(&self) -> f32 {
        self.channel_bands_energy[0][1] + self.channel_bands_energy[1][1]
    }

    pub fn treble_energy(&self) -> f32 {
        self.channel_bands_energy[0][2] + self.channel_bands_energy[1][2]
    }

    pub fn channel_band_left(&self, band: usize) -> f32 {
        self.channel_bands[0][band.min(NUM_FILTER_BANDS - 1)]
    }

    pub fn channel_band_right(&self, band: usize) -> f32 {
        self.channel_bands[1][band.min(NUM_FILTER_BANDS - 1)]
    }

    pub fn channel_band(&self, band: usize) -> f32 {
        self.channel_band_left(band) + self.channel_band_right(band)
    }

    pub fn sampling_rate(&self) -> u32 {
        self.config.sampling_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_tone(frames: usize, frequency: f32, sampling_rate: f32) -> Vec<f32> {
        let mut samples = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let value = (2.0 * std::f32::consts::PI * frequency * i as f32 / sampling_rate).sin();
            samples.push(value);
            samples.push(value);
        }
        samples
    }

    #[test]
    fn power_of_constant_buffer() {
        let mut state = FeatureState::new(FeatureConfig::default());
        state.update(&[0.5, 0.5, 0.5, 0.5], 0.01);
        assert!((state.power() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn energy_is_monotonic_for_non_negative_input() {
        let mut state = FeatureState::new(FeatureConfig::default());
        let mut previous = state.energy().value();
        for i in 0..50 {
            let amplitude = (i % 5) as f32 * 0.1;
            state.update(&[amplitude; 512], 0.016);
            assert!(state.energy().value() >= previous);
            previous = state.energy().value();
        }
    }

    #[test]
    fn average_power_is_seeded_on_exactly_the_hundredth_update() {
        let mut state = FeatureState::new(FeatureConfig::default());
        for _ in 0..99 {
            state.update(&[0.5; 64], 0.01);
            assert_eq!(state.average_power(), 0.0);
        }
        state.update(&[0.5; 64], 0.01);
        assert!(state.average_power() > 0.0);
    }

    #[test]
    fn average_power_converges_near_signal_power() {
        let mut state = FeatureState::new(FeatureConfig::default());
        for _ in 0..100 {
            state.update(&[1.0; 64], 0.01);
        }
        // The fast warm-up filter should land within the right order of
        // magnitude of the true power (1.0) by the time it seeds.
        assert!(state.average_power() > 0.5);
        assert!(state.average_power() <= 1.0 + 1e-3);
    }

    #[test]
    fn normalized_energy_waits_for_average_power() {
        let mut state = FeatureState::new(FeatureConfig::default());
        for _ in 0..99 {
            state.update(&[0.5; 64], 0.01);
        }
        assert_eq!(state.normalized_energy().value(), 0.0);
        for _ in 0..10 {
            state.update(&[0.5; 64], 0.01);
        }
        assert!(state.normalized_energy().value() > 0.0);
    }

    #[test]
    fn bass_tone_lands_in_bass_band() {
        let mut state = FeatureState::new(FeatureConfig::default());
        let samples = stereo_tone(4096, 100.0, 44100.0);
        for _ in 0..10 {
            state.update(&samples, 0.016);
        }
        assert!(state.bass() > state.treble() * 10.0);
    }

    #[test]
    fn treble_tone_lands_in_treble_band() {
        let mut state = FeatureState::new(FeatureConfig::default());
        let samples = stereo_tone(4096, 8000.0, 44100.0);
        for _ in 0..10 {
            state.update(&samples, 0.016);
        }
        assert!(state.treble() > state.bass() * 10.0);
    }

    #[test]
    fn unitized_bands_stay_in_unit_range() {
        let mut state = FeatureState::new(FeatureConfig::default());
        let samples = stereo_tone(2048, 150.0, 44100.0);
        for _ in 0..20 {
            state.update(&samples, 0.016);
            for value in [state.bass_u(), state.mid_u(), state.treble_u()] {
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn max_dt_clamps_stalled_frames() {
        let mut state = FeatureState::new(FeatureConfig {
            max_dt: Some(0.1),
            ..FeatureConfig::default()
        });
        state.update(&[1.0; 64], 5.0);
        assert_eq!(state.dt(), 0.1);
        assert!((state.energy().value() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn empty_batch_leaves_power_at_zero() {
        let mut state = FeatureState::new(FeatureConfig::default());
        state.update(&[], 0.01);
        assert_eq!(state.power(), 0.0);
        assert_eq!(state.dt(), 0.01);
    }

    #[test]
    fn channel_buffers_resize_with_batch_length() {
        let mut state = FeatureState::new(FeatureConfig::default());
        state.update(&[0.1; 8], 0.01);
        assert_eq!(state.left_channel().len(), 4);
        state.update(&[0.1; 16], 0.01);
        assert_eq!(state.left_channel().len(), 8);
        assert_eq!(state.right_channel().len(), 8);
    }
}
