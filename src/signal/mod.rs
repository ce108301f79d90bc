pub mod accumulator;
pub mod interpolator;
pub mod oneshot;
pub mod unitizer;

pub use accumulator::Accumulator;
pub use interpolator::{lerp, Interpolator};
pub use oneshot::OneshotTimer;
pub use unitizer::Unitizer;
