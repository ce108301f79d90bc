use super::interpolator::Interpolator;

/// Running sum of a scalar signal, optionally wrapping at a fixed period.
///
/// Used for time-integrated quantities (energy, normalized energy) where
/// consumers sometimes want to interpolate across the most recent step
/// rather than observe it as a jump.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    value: f32,
    period: Option<f32>,
    last_step: f32,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, value: f32) -> &mut Self {
        self.value = value;
        self
    }

    /// Makes the accumulator periodic: after each update the value is wrapped
    /// back into `[0, period)`.
    pub fn set_period(&mut self, period: f32) -> &mut Self {
        self.period = Some(period);
        self
    }

    /// Adds `step` to the accumulated value and returns the new value.
    pub fn update(&mut self, step: f32) -> f32 {
        self.last_step = step;
        self.value += step;

        if let Some(period) = self.period {
            if self.value > period {
                self.value -= (self.value / period).floor() * period;
            }
        }

        self.value
    }

    /// Interpolator sweeping from the value before the last update to the
    /// current value, in increments of `step_size`.
    pub fn interpolate_last_step(&self, step_size: f32) -> Interpolator {
        Interpolator::new(self.value - self.last_step, self.value, step_size)
    }

    pub fn interpolate_last_step_with_count(&self, step_count: usize) -> Interpolator {
        Interpolator::with_step_count(self.value - self.last_step, self.value, step_count)
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn last_step(&self) -> f32 {
        self.last_step
    }
}

impl std::ops::AddAssign<f32> for Accumulator {
    fn add_assign(&mut self, step: f32) {
        self.update(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_steps() {
        let mut acc = Accumulator::new();
        acc += 1.5;
        acc += 0.25;
        assert_eq!(acc.value(), 1.75);
        assert_eq!(acc.last_step(), 0.25);
    }

    #[test]
    fn non_negative_steps_never_decrease_value() {
        let mut acc = Accumulator::new();
        let mut previous = acc.value();
        for step in [0.0, 0.1, 0.0, 2.0, 0.0001, 0.5] {
            acc += step;
            assert!(acc.value() >= previous);
            previous = acc.value();
        }
    }

    #[test]
    fn periodic_wraps_into_range() {
        let mut acc = Accumulator::new();
        acc.set_period(1.0);
        acc += 2.75;
        assert!((acc.value() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn interpolates_across_last_step() {
        let mut acc = Accumulator::new();
        acc += 1.0;
        acc += 1.0;
        let values: Vec<f32> = acc.interpolate_last_step(0.5).collect();
        assert_eq!(values, vec![1.0, 1.5, 2.0]);
    }
}
