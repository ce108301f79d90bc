/// One-shot timer advanced incrementally by frame delta times.
///
/// Drives preset lifecycle transitions, where the caller owns the clock and
/// feeds elapsed time each frame rather than comparing against an absolute
/// deadline.
#[derive(Debug, Clone)]
pub struct OneshotTimer {
    duration: f32,
    elapsed: f32,
    fired: bool,
}

impl OneshotTimer {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            fired: false,
        }
    }

    /// Rewinds the timer to the beginning of its duration.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.fired = false;
    }

    /// Advances the timer by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> &mut Self {
        self.elapsed += dt;
        self
    }

    pub fn is_due(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Like `is_due`, but only reports true the first time it is observed due
    /// after a reset.
    pub fn is_due_once(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = self.elapsed >= self.duration;
        self.fired
    }

    /// Fraction of the duration elapsed so far: 0 when freshly reset, 1 when
    /// due. Exceeds 1 if updated past the deadline.
    pub fn fraction_due(&self) -> f32 {
        self.elapsed / self.duration
    }
}
