use std::collections::HashMap;

use crate::signal::lerp;

/// Fraction of the tracked peak used as the onset trigger level.
const THRESHOLD_FRACTION: f32 = 0.8;

/// Recorded inter-onset durations retained per histogram bin.
const NUM_ENTRIES: usize = 10;

/// Minimum time between onsets, in seconds. Suppresses double-triggering on
/// a single transient.
const COOLDOWN_TIME: f32 = 0.005;

/// Width of one histogram bin, in seconds.
const BIN_RESOLUTION: f32 = 0.001;

#[derive(Debug, Clone)]
struct BinEntry {
    score: f32,
    durations: [f32; NUM_ENTRIES],
    head: usize,
    len: usize,
}

impl BinEntry {
    fn new() -> Self {
        Self {
            score: 0.0,
            durations: [0.0; NUM_ENTRIES],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, duration: f32) {
        self.score += 1.0;
        self.durations[self.head] = duration;
        self.head = (self.head + 1) % NUM_ENTRIES;
        self.len = (self.len + 1).min(NUM_ENTRIES);
    }

    fn mean_duration(&self) -> f32 {
        self.durations[..self.len.max(1)].iter().sum::<f32>() / self.len.max(1) as f32
    }
}

/// Adaptive onset tracker estimating a continuous beat phase for one signal.
///
/// Onsets are rising edges of the signal past a trigger level derived from
/// its adaptively tracked peak. Inter-onset intervals are scored into a
/// decaying histogram; the estimated beat `duration` is the mean of the
/// intervals recorded in the most-reinforced bin, which makes the estimate
/// robust to the occasional misdetected beat.
pub struct BeatEstimator {
    alpha: f32,
    bins: HashMap<i32, BinEntry>,

    count: f32,
    duration: f32,
    threshold: f32,
    is_beat: bool,

    triangle_target_value: f32,
    triangle_last_beat_value: f32,
}

impl BeatEstimator {
    /// `alpha` controls both the peak-threshold decay and the histogram score
    /// decay; values close to 1 adapt slowly.
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            bins: HashMap::new(),
            count: 0.0,
            duration: 0.0,
            threshold: 0.0,
            is_beat: false,
            triangle_target_value: 0.0,
            triangle_last_beat_value: 0.0,
        }
    }

    /// Folds one sample of the monitored signal into the estimate. `dt` is
    /// the elapsed time since the previous call.
    pub fn estimate(&mut self, signal: f32, dt: f32) -> &Self {
        for entry in self.bins.values_mut() {
            entry.score *= self.alpha;
        }

        let signal = signal.abs();
        let is_beat_current = signal > self.threshold * THRESHOLD_FRACTION;

        if signal > self.threshold {
            self.threshold = signal;
        } else {
            self.threshold = self.threshold * self.alpha + signal * (1.0 - self.alpha);
        }

        if !self.is_beat && is_beat_current && self.count > COOLDOWN_TIME {
            // Confirmed onset: flip the triangle target and snapshot the
            // previous target so the ramp stays continuous across the flip.
            self.triangle_last_beat_value = self.triangle_phase();
            self.triangle_target_value = 1.0 - self.triangle_target_value;

            self.push_count();
            self.duration = self.best_bin_duration();
        } else {
            self.count += dt;
        }

        self.is_beat = is_beat_current;
        self
    }

    /// Whether the onset condition held during the last `estimate` call.
    pub fn beat(&self) -> bool {
        self.is_beat
    }

    /// Fraction of the estimated beat period elapsed since the last onset.
    pub fn phase(&self) -> f32 {
        if self.duration == 0.0 {
            return 0.0;
        }
        (self.count / self.duration).clamp(0.0, 1.0)
    }

    /// Continuous 0-to-1-to-0 ramp synchronized to the estimated beat period.
    pub fn triangle_phase(&self) -> f32 {
        lerp(
            self.triangle_last_beat_value,
            self.triangle_target_value,
            self.phase(),
        )
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Currently estimated inter-onset duration, in seconds.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    fn push_count(&mut self) {
        let bin = Self::bin_for(self.count);
        self.bins.entry(bin).or_insert_with(BinEntry::new).push(self.count);
        self.count = 0.0;
    }

    fn best_bin_duration(&self) -> f32 {
        self.bins
            .values()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .map(BinEntry::mean_duration)
            .unwrap_or(0.0)
    }

    fn bin_for(count: f32) -> i32 {
        (count / BIN_RESOLUTION).round() as i32
    }
}
