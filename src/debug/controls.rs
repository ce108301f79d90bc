use std::collections::HashMap;

use log::debug;

/// Named signal tap with externally settable overrides.
///
/// Constructed and owned by the caller and passed into whatever consumes the
/// control signals; there is no process-wide instance, so tests can inject
/// values deterministically. Each `signal` call records the live value (for
/// inspection or plotting) and returns either the passthrough value or the
/// current override for that name.
#[derive(Debug, Default)]
pub struct SignalInjector {
    overrides: HashMap<String, f32>,
    last_values: HashMap<String, f32>,
}

impl SignalInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Taps the named signal: records `value` and returns the override for
    /// `name` if one is set, otherwise `value` unchanged.
    pub fn signal(&mut self, name: &str, value: f32) -> f32 {
        match self.last_values.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.last_values.insert(name.to_string(), value);
            }
        }
        self.overrides.get(name).copied().unwrap_or(value)
    }

    /// Like `signal`, but maps the override into `[low, high]` so callers can
    /// express bounded controls against normalized override values.
    pub fn signal_clamped(&mut self, name: &str, value: f32, low: f32, high: f32) -> f32 {
        self.signal(name, value).clamp(low, high)
    }

    pub fn set_override(&mut self, name: &str, value: f32) {
        debug!("Overriding signal {} = {}", name, value);
        self.overrides.insert(name.to_string(), value);
    }

    pub fn clear_override(&mut self, name: &str) {
        self.overrides.remove(name);
    }

    /// Most recent live (pre-override) value observed for `name`.
    pub fn last_value(&self, name: &str) -> Option<f32> {
        self.last_values.get(name).copied()
    }

    pub fn signal_names(&self) -> impl Iterator<Item = &str> {
        self.last_values.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_without_override() {
        let mut injector = SignalInjector::new();
        assert_eq!(injector.signal("bass_u", 0.7), 0.7);
        assert_eq!(injector.last_value("bass_u"), Some(0.7));
    }

    #[test]
    fn override_replaces_value_but_still_records_it() {
        let mut injector = SignalInjector::new();
        injector.set_override("bass_u", 1.0);
        assert_eq!(injector.signal("bass_u", 0.3), 1.0);
        // The live value is still observable underneath the override.
        assert_eq!(injector.last_value("bass_u"), Some(0.3));

        injector.clear_override("bass_u");
        assert_eq!(injector.signal("bass_u", 0.3), 0.3);
    }

    #[test]
    fn clamped_signal_bounds_the_override() {
        let mut injector = SignalInjector::new();
        injector.set_override("phase", 3.0);
        assert_eq!(injector.signal_clamped("phase", 0.2, 0.0, 1.0), 1.0);
    }
}
