use log::info;

use crate::audio::FeatureState;

use super::activation::{ActivationState, PresetActivation};
use super::surface::{Compositor, Surface, SurfaceArena};
use super::Preset;

/// Scheduler owning every live preset activation.
///
/// Activations are stored oldest-first, so drawing in collection order puts
/// the most recently added preset on top. Retirement runs once per frame and
/// guarantees that at most one activation remains durably visible: waiting
/// presets fade out as soon as a newer one holds the screen, and the oldest
/// waiting preset is kept alive when nothing else does.
pub struct PresetBlender<S: Surface> {
    width: u32,
    height: u32,
    surfaces: SurfaceArena<S>,
    activations: Vec<PresetActivation<S>>,
    compositor: Box<dyn Compositor<S>>,
}

impl<S: Surface> PresetBlender<S> {
    pub fn new(width: u32, height: u32, compositor: Box<dyn Compositor<S>>) -> Self {
        Self {
            width,
            height,
            surfaces: SurfaceArena::new(),
            activations: Vec::new(),
            compositor,
        }
    }

    /// Admits a new preset, fading it in over `transition_duration_s` and
    /// keeping it on screen for at least `minimum_duration_s`.
    pub fn add_preset(
        &mut self,
        mut preset: Box<dyn Preset<S>>,
        mut surface: S,
        minimum_duration_s: f32,
        transition_duration_s: f32,
    ) {
        info!("Adding preset: {}", preset.name());
        preset.update_geometry(self.width, self.height);
        surface.update_geometry(self.width, self.height);

        let surface = self.surfaces.alloc(surface);
        self.activations.push(PresetActivation::new(
            preset,
            surface,
            minimum_duration_s,
            transition_duration_s,
        ));
    }

    /// Draws one frame of blended preset output onto `output`.
    ///
    /// Every activation with a nonzero mixing coefficient first renders into
    /// its private surface at full internal opacity, then the surfaces are
    /// composited source-over onto `output` weighted by their coefficients,
    /// oldest first.
    pub fn draw_frame(&mut self, samples: &[f32], features: &FeatureState, output: &mut S) {
        self.update(features.dt());

        for activation in &mut self.activations {
            if activation.mixing_coefficient() == 0.0 {
                continue;
            }
            let surface = self.surfaces.get_mut(activation.surface());
            activation
                .preset_mut()
                .draw_frame(samples, features, 1.0, surface);
        }

        output.activate();
        for activation in &self.activations {
            let coefficient = activation.mixing_coefficient();
            if coefficient == 0.0 {
                continue;
            }
            let surface = self.surfaces.get(activation.surface());
            self.compositor.composite(surface, coefficient, output);
        }
    }

    pub fn update_geometry(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        for activation in &mut self.activations {
            activation.preset_mut().update_geometry(width, height);
            self.surfaces
                .get_mut(activation.surface())
                .update_geometry(width, height);
        }
    }

    pub fn num_presets(&self) -> usize {
        self.activations.len()
    }

    /// Number of live activations whose preset reports the given name.
    pub fn query_preset_count(&self, name: &str) -> usize {
        self.activations
            .iter()
            .filter(|activation| activation.preset().name() == name)
            .count()
    }

    /// Requests a fade-out on every activation that can accept one. The
    /// retirement policy still keeps the oldest waiting preset alive until a
    /// replacement holds the screen.
    pub fn transition_out_all(&mut self) {
        for activation in &mut self.activations {
            activation.trigger_transition_out();
        }
    }

    /// Advances every activation, erases the fully transitioned-out ones, and
    /// applies the retirement policy.
    fn update(&mut self, dt: f32) {
        let mut activations_in = 0;
        for activation in &mut self.activations {
            let state = activation.update(dt);
            if state == ActivationState::TransitionIn || state == ActivationState::In {
                activations_in += 1;
            }
        }

        let surfaces = &mut self.surfaces;
        self.activations.retain(|activation| {
            if activation.state() == ActivationState::Out {
                surfaces.free(activation.surface());
                false
            } else {
                true
            }
        });

        // Oldest-first list of activations waiting for permission to retire.
        let waiting: Vec<usize> = self
            .activations
            .iter()
            .enumerate()
            .filter(|(_, activation)| {
                activation.state() == ActivationState::AwaitingTransitionOut
            })
            .map(|(index, _)| index)
            .collect();

        if activations_in > 0 {
            // A newer preset has taken over; everything waiting may go.
            for &index in &waiting {
                self.activations[index].trigger_transition_out();
            }
        } else {
            // Nothing is holding the screen. Keep the oldest waiting preset
            // visible so the output never goes dark.
            for &index in waiting.iter().skip(1) {
                self.activations[index].trigger_transition_out();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::audio::{FeatureConfig, FeatureState};

    #[derive(Default)]
    struct TestSurface {
        label: &'static str,
        width: u32,
        height: u32,
        activated: usize,
    }

    impl Surface for TestSurface {
        fn activate(&mut self) {
            self.activated += 1;
        }
        fn update_geometry(&mut self, width: u32, height: u32) {
            self.width = width;
            self.height = height;
        }
    }

    struct TestPreset {
        name: &'static str,
        draws: Rc<RefCell<Vec<(&'static str, f32)>>>,
    }

    impl Preset<TestSurface> for TestPreset {
        fn draw_frame(
            &mut self,
            _samples: &[f32],
            _features: &FeatureState,
            alpha: f32,
            _target: &mut TestSurface,
        ) {
            self.draws.borrow_mut().push((self.name, alpha));
        }
        fn update_geometry(&mut self, _width: u32, _height: u32) {}
        fn name(&self) -> &str {
            self.name
        }
    }

    /// Records every composite call as (source label, weight).
    struct TestCompositor {
        blits: Rc<RefCell<Vec<(&'static str, f32)>>>,
    }

    impl Compositor<TestSurface> for TestCompositor {
        fn composite(&mut self, source: &TestSurface, alpha: f32, _output: &mut TestSurface) {
            self.blits.borrow_mut().push((source.label, alpha));
        }
    }

    struct Fixture {
        blender: PresetBlender<TestSurface>,
        draws: Rc<RefCell<Vec<(&'static str, f32)>>>,
        blits: Rc<RefCell<Vec<(&'static str, f32)>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let draws = Rc::new(RefCell::new(Vec::new()));
            let blits = Rc::new(RefCell::new(Vec::new()));
            let compositor = TestCompositor {
                blits: Rc::clone(&blits),
            };
            Self {
                blender: PresetBlender::new(640, 480, Box::new(compositor)),
                draws,
                blits,
            }
        }

        fn add(&mut self, name: &'static str, minimum: f32, transition: f32) {
            let preset = TestPreset {
                name,
                draws: Rc::clone(&self.draws),
            };
            let surface = TestSurface {
                label: name,
                ..TestSurface::default()
            };
            self.blender
                .add_preset(Box::new(preset), surface, minimum, transition);
        }

        fn step(&mut self, dt: f32) {
            self.blender.update(dt);
        }

        fn states(&self) -> Vec<ActivationState> {
            self.blender
                .activations
                .iter()
                .map(|activation| activation.state())
                .collect()
        }
    }

    #[test]
    fn admitted_preset_receives_current_geometry() {
        let mut fixture = Fixture::new();
        fixture.add("a", 1.0, 0.1);
        let surface = fixture
            .blender
            .surfaces
            .get(fixture.blender.activations[0].surface());
        assert_eq!((surface.width, surface.height), (640, 480));
    }

    #[test]
    fn lone_waiting_preset_is_kept_alive() {
        let mut fixture = Fixture::new();
        fixture.add("a", 0.5, 0.1);
        for _ in 0..200 {
            fixture.step(0.01);
        }
        // Expired long ago, but with no replacement it must stay visible.
        assert_eq!(fixture.states(), vec![ActivationState::AwaitingTransitionOut]);
        assert_eq!(fixture.blender.num_presets(), 1);
    }

    #[test]
    fn waiting_preset_retires_once_replacement_is_transitioning_in() {
        let mut fixture = Fixture::new();
        fixture.add("a", 0.5, 0.1);
        for _ in 0..100 {
            fixture.step(0.01);
        }
        assert_eq!(fixture.states(), vec![ActivationState::AwaitingTransitionOut]);

        // A newly admitted preset counts as holding the screen even while it
        // is still fading in, so the waiting preset may go immediately.
        fixture.add("b", 0.5, 0.1);
        fixture.step(0.01);
        assert_eq!(
            fixture.states(),
            vec![
                ActivationState::TransitionOut,
                ActivationState::TransitionIn,
            ]
        );

        // Once its fade-out completes it is erased, and its surface freed.
        for _ in 0..20 {
            fixture.step(0.01);
        }
        assert_eq!(fixture.blender.num_presets(), 1);
        assert_eq!(fixture.blender.query_preset_count("a"), 0);
        assert_eq!(fixture.blender.query_preset_count("b"), 1);
        assert_eq!(fixture.blender.surfaces.len(), 1);
    }

    #[test]
    fn oldest_of_several_waiting_presets_survives() {
        let mut fixture = Fixture::new();
        fixture.add("a", 0.3, 0.1);
        fixture.add("b", 0.3, 0.1);
        // Both expire on the same tick (fade-in 0.1 s + hold 0.1 s). With
        // nothing in, the policy retires everything but the oldest within
        // that same update.
        for _ in 0..20 {
            fixture.step(0.01);
        }
        assert_eq!(
            fixture.states(),
            vec![
                ActivationState::AwaitingTransitionOut,
                ActivationState::TransitionOut,
            ]
        );
    }

    #[test]
    fn draw_frame_composites_nonzero_activations_in_order() {
        let mut fixture = Fixture::new();
        fixture.add("a", 1.0, 0.1);
        fixture.add("b", 1.0, 0.1);

        let mut features = FeatureState::new(FeatureConfig::default());
        features.update(&[0.0; 64], 0.05);

        let mut output = TestSurface {
            label: "output",
            ..TestSurface::default()
        };
        fixture.blender.draw_frame(&[], &features, &mut output);

        // Both presets drew into their own surfaces at full opacity.
        assert_eq!(&*fixture.draws.borrow(), &[("a", 1.0), ("b", 1.0)]);

        // Composited oldest first, weighted by the fade-in coefficient.
        let blits = fixture.blits.borrow();
        assert_eq!(blits.len(), 2);
        assert_eq!(blits[0].0, "a");
        assert_eq!(blits[1].0, "b");
        assert!((blits[0].1 - 0.5).abs() < 1e-4);
        assert!((blits[1].1 - 0.5).abs() < 1e-4);
        assert_eq!(output.activated, 1);
    }

    #[test]
    fn zero_coefficient_activations_are_skipped() {
        let mut fixture = Fixture::new();
        fixture.add("a", 1.0, 0.1);

        let mut features = FeatureState::new(FeatureConfig::default());
        features.update(&[0.0; 64], 0.0);

        let mut output = TestSurface::default();
        // dt = 0 leaves the fade-in coefficient at zero; nothing draws.
        fixture.blender.draw_frame(&[], &features, &mut output);
        assert!(fixture.draws.borrow().is_empty());
        assert!(fixture.blits.borrow().is_empty());
    }

    #[test]
    fn transition_out_all_fades_out_the_current_preset() {
        let mut fixture = Fixture::new();
        fixture.add("a", 0.5, 0.1);
        for _ in 0..20 {
            fixture.step(0.01);
        }
        assert_eq!(fixture.states(), vec![ActivationState::In]);

        fixture.blender.transition_out_all();
        assert_eq!(fixture.states(), vec![ActivationState::TransitionOut]);
        for _ in 0..20 {
            fixture.step(0.01);
        }
        assert_eq!(fixture.blender.num_presets(), 0);
        assert!(fixture.blender.surfaces.is_empty());
    }

    #[test]
    fn update_geometry_reaches_every_surface() {
        let mut fixture = Fixture::new();
        fixture.add("a", 1.0, 0.1);
        fixture.add("b", 1.0, 0.1);
        fixture.blender.update_geometry(1920, 1080);
        for activation in &fixture.blender.activations {
            let surface = fixture.blender.surfaces.get(activation.surface());
            assert_eq!((surface.width, surface.height), (1920, 1080));
        }
    }
}
