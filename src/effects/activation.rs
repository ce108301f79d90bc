use crate::signal::OneshotTimer;

use super::surface::{Surface, SurfaceId};
use super::Preset;

/// Lifecycle of one running preset.
///
/// `AwaitingTransitionOut` never advances on its own; the blender's
/// retirement policy decides when a waiting preset may actually fade out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    TransitionIn,
    In,
    AwaitingTransitionOut,
    TransitionOut,
    Out,
}

/// One concurrently live preset: the effect instance, its private render
/// surface, and the timers driving its fade-in/hold/fade-out lifecycle.
pub struct PresetActivation<S: Surface> {
    preset: Box<dyn Preset<S>>,
    surface: SurfaceId,
    state: ActivationState,
    expiry_timer: OneshotTimer,
    transition_timer: OneshotTimer,
    maximal_mix_coeff: f32,
}

impl<S: Surface> PresetActivation<S> {
    /// Panics unless `minimum_duration_s >= 2 * transition_duration_s`; a
    /// shorter minimum cannot contain both transitions and indicates a
    /// programming error at the call site.
    pub fn new(
        preset: Box<dyn Preset<S>>,
        surface: SurfaceId,
        minimum_duration_s: f32,
        transition_duration_s: f32,
    ) -> Self {
        assert!(
            minimum_duration_s >= transition_duration_s * 2.0,
            "Minimum duration must be at least twice the transition duration \
             (minimum: {minimum_duration_s}, transition: {transition_duration_s})"
        );

        Self {
            preset,
            surface,
            state: ActivationState::TransitionIn,
            expiry_timer: OneshotTimer::new(minimum_duration_s - transition_duration_s * 2.0),
            transition_timer: OneshotTimer::new(transition_duration_s),
            maximal_mix_coeff: 1.0,
        }
    }

    /// Advances the lifecycle timers by `dt` and returns the state after any
    /// resulting transition.
    pub fn update(&mut self, dt: f32) -> ActivationState {
        match self.state {
            ActivationState::TransitionIn => {
                if self.transition_timer.update(dt).is_due() {
                    self.state = ActivationState::In;
                    self.expiry_timer.reset();
                }
            }

            ActivationState::In => {
                if self.expiry_timer.update(dt).is_due() {
                    self.state = ActivationState::AwaitingTransitionOut;
                }
            }

            ActivationState::AwaitingTransitionOut => {}

            ActivationState::TransitionOut => {
                if self.transition_timer.update(dt).is_due() {
                    self.state = ActivationState::Out;
                }
            }

            ActivationState::Out => {}
        }

        self.state
    }

    /// Begins the fade-out. Legal while fading in (the current partial
    /// opacity is frozen so the fade-out starts from it rather than jumping
    /// to full), while in, or while awaiting retirement. No-op once the
    /// fade-out has already begun.
    pub fn trigger_transition_out(&mut self) {
        match self.state {
            ActivationState::TransitionIn => {
                self.maximal_mix_coeff = self.transition_timer.fraction_due().clamp(0.0, 1.0);
            }
            ActivationState::In | ActivationState::AwaitingTransitionOut => {}
            ActivationState::TransitionOut | ActivationState::Out => return,
        }

        self.state = ActivationState::TransitionOut;
        self.transition_timer.reset();
    }

    /// Opacity of this activation in the composited output, always in
    /// `[0, 1]`.
    pub fn mixing_coefficient(&self) -> f32 {
        match self.state {
            ActivationState::TransitionIn => self.transition_timer.fraction_due().clamp(0.0, 1.0),
            ActivationState::In | ActivationState::AwaitingTransitionOut => self.maximal_mix_coeff,
            ActivationState::TransitionOut => {
                (1.0 - self.transition_timer.fraction_due().clamp(0.0, 1.0))
                    * self.maximal_mix_coeff
            }
            ActivationState::Out => 0.0,
        }
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn preset(&self) -> &dyn Preset<S> {
        self.preset.as_ref()
    }

    pub fn preset_mut(&mut self) -> &mut dyn Preset<S> {
        self.preset.as_mut()
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }
}
