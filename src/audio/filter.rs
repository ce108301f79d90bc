use std::f32::consts::PI;

/// A stateful single-sample digital filter.
pub trait Filter {
    /// Processes one input sample and returns the corresponding output sample.
    fn process_sample(&mut self, sample: f32) -> f32;

    /// Runs every sample in `samples` through the filter and returns the mean
    /// squared output, i.e. the power of the filtered signal.
    fn compute_power(&mut self, samples: &[f32]) -> f32 {
        let mut power = 0.0;
        for &sample in samples {
            let out = self.process_sample(sample);
            power += out * out;
        }
        power / samples.len() as f32
    }
}

/// Finite impulse response time-domain convolutional filter.
pub struct FirFilter {
    taps: Vec<f32>,
    // Input history, most recent sample at index 0.
    input_history: Vec<f32>,
}

impl FirFilter {
    pub fn new(taps: Vec<f32>) -> Self {
        let input_history = vec![0.0; taps.len()];
        Self {
            taps,
            input_history,
        }
    }

    #[cfg(test)]
    pub(crate) fn history_len(&self) -> usize {
        self.input_history.len()
    }
}

impl Filter for FirFilter {
    fn process_sample(&mut self, sample: f32) -> f32 {
        self.input_history.rotate_right(1);
        self.input_history[0] = sample;

        self.input_history
            .iter()
            .zip(&self.taps)
            .map(|(x, tap)| x * tap)
            .sum()
    }
}

/// Infinite impulse response time-domain convolutional filter.
///
/// `x_taps` weight the input history (ordered as in `FirFilter`); `y_taps`
/// weight the output history, with index 0 multiplying the immediately
/// previous output of the filter.
pub struct IirFilter {
    x_taps: Vec<f32>,
    input_history: Vec<f32>,
    y_taps: Vec<f32>,
    output_history: Vec<f32>,
}

impl IirFilter {
    pub fn new(x_taps: Vec<f32>, y_taps: Vec<f32>) -> Self {
        let input_history = vec![0.0; x_taps.len()];
        let output_history = vec![0.0; y_taps.len()];
        Self {
            x_taps,
            input_history,
            y_taps,
            output_history,
        }
    }

    /// Single-pole low-pass filter smoothing by `alpha`: an output decays
    /// toward the input with weight `(1 - alpha)` per sample.
    pub fn low_pass(alpha: f32) -> Self {
        Self::new(vec![1.0 - alpha], vec![alpha])
    }

    #[cfg(test)]
    pub(crate) fn history_lens(&self) -> (usize, usize) {
        (self.input_history.len(), self.output_history.len())
    }
}

impl Filter for IirFilter {
    fn process_sample(&mut self, sample: f32) -> f32 {
        self.input_history.rotate_right(1);
        self.input_history[0] = sample;

        let mut output: f32 = self
            .input_history
            .iter()
            .zip(&self.x_taps)
            .map(|(x, tap)| x * tap)
            .sum();
        output += self
            .output_history
            .iter()
            .zip(&self.y_taps)
            .map(|(y, tap)| y * tap)
            .sum::<f32>();

        self.output_history.rotate_right(1);
        if let Some(head) = self.output_history.first_mut() {
            *head = output;
        }

        output
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandFilterKind {
    Bandpass,
    Bandstop,
}

/// Builds a 2-pole bandpass or bandstop biquad centered on `center_frequency`
/// with the given `bandwidth`.
///
/// Both frequencies must already be normalized by the sampling rate, i.e. lie
/// in `[0, 0.5)`. Out-of-range inputs are not validated and produce an
/// unstable filter; keeping them in range is the caller's responsibility.
pub fn iir_band_filter(center_frequency: f32, bandwidth: f32, kind: BandFilterKind) -> IirFilter {
    let cos_2_pi_f = (2.0 * PI * center_frequency).cos();
    let r = 1.0 - 3.0 * bandwidth;
    let k = (1.0 - 2.0 * r * cos_2_pi_f + r * r) / (2.0 - 2.0 * cos_2_pi_f);

    let y_taps = vec![2.0 * r * cos_2_pi_f, -(r * r)];
    match kind {
        BandFilterKind::Bandpass => IirFilter::new(
            vec![1.0 - k, 2.0 * (k - r) * cos_2_pi_f, r * r - k],
            y_taps,
        ),
        BandFilterKind::Bandstop => {
            IirFilter::new(vec![k, -2.0 * k * cos_2_pi_f, k], y_taps)
        }
    }
}
