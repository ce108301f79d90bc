/// Linear interpolation between `a` and `b` by `t` in `[0, 1]`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Iterator yielding evenly spaced values from a start value to an end value,
/// inclusive of both endpoints. The final step is shortened if the distance is
/// not an exact multiple of the step size.
#[derive(Debug, Clone)]
pub struct Interpolator {
    current: Option<f32>,
    end: f32,
    step: f32,
}

impl Interpolator {
    /// Constructs an interpolator stepping from `begin` to `end` by `step`.
    /// The sign of `step` is coerced to match the direction of travel.
    pub fn new(begin: f32, end: f32, step: f32) -> Self {
        let magnitude = step.abs().max(f32::EPSILON);
        let step = if end >= begin { magnitude } else { -magnitude };
        Self {
            current: Some(begin),
            end,
            step,
        }
    }

    /// Constructs an interpolator that covers `begin..=end` in `step_count`
    /// equal increments.
    pub fn with_step_count(begin: f32, end: f32, step_count: usize) -> Self {
        if begin == end || step_count == 0 {
            return Self {
                current: Some(begin),
                end,
                step: f32::EPSILON,
            };
        }
        Self::new(begin, end, (end - begin) / step_count as f32)
    }
}

impl Iterator for Interpolator {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let value = self.current?;

        if value == self.end {
            self.current = None;
        } else {
            let mut next = value + self.step;
            if (self.step > 0.0 && next > self.end) || (self.step < 0.0 && next < self.end) {
                next = self.end;
            }
            self.current = Some(next);
        }

        Some(value)
    }
}
