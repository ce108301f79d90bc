pub mod activation;
pub mod blender;
pub mod surface;

pub use activation::{ActivationState, PresetActivation};
pub use blender::PresetBlender;
pub use surface::{Compositor, Surface, SurfaceArena, SurfaceId};

use crate::audio::FeatureState;

/// One visual effect, drawn once per frame by the scheduler.
///
/// Implementations receive the drained sample batch, the current feature
/// snapshot, and the alpha to premultiply into their output. The rendering
/// backend stays behind the `Surface` parameter; this crate never touches it
/// beyond the trait.
pub trait Preset<S: Surface> {
    /// Draws a single frame of this preset into `target`.
    fn draw_frame(&mut self, samples: &[f32], features: &FeatureState, alpha: f32, target: &mut S);

    /// Updates the preset render geometry. Subsequent `draw_frame` calls
    /// render at these dimensions.
    fn update_geometry(&mut self, width: u32, height: u32);

    fn name(&self) -> &str;
}
