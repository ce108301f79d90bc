use serde::{Deserialize, Serialize};

/// Maps an arbitrarily scaled non-negative signal into roughly `[0, 1]` by
/// dividing it by an adaptively tracked running level.
///
/// The tracked level snaps instantly upward to any sample exceeding it (so
/// output never exceeds 1) and otherwise decays exponentially toward the
/// incoming signal, so the output recovers sensitivity after loud passages.
#[derive(Debug, Clone)]
pub struct Unitizer {
    average: f32,
    options: UnitizerOptions,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnitizerOptions {
    /// Snap the tracked level up to any new maximum immediately.
    pub instant_upscale: bool,
    /// Decay coefficient for the tracked level when not snapping up.
    pub alpha: f32,
}

impl Default for UnitizerOptions {
    fn default() -> Self {
        Self {
            instant_upscale: true,
            alpha: 0.99,
        }
    }
}

impl Default for Unitizer {
    fn default() -> Self {
        Self::new(UnitizerOptions::default())
    }
}

impl Unitizer {
    pub fn new(options: UnitizerOptions) -> Self {
        Self {
            average: 0.0,
            options,
        }
    }

    pub fn update(&mut self, sample: f32) -> f32 {
        if sample > self.average && self.options.instant_upscale {
            self.average = sample;
        } else {
            self.average = self.average * self.options.alpha + sample * (1.0 - self.options.alpha);
        }

        if sample > self.average {
            return 1.0;
        }

        // A silent signal never raises the tracked level above zero.
        if self.average == 0.0 {
            return 0.0;
        }

        sample / self.average
    }
}
