pub mod controls;

pub use controls::SignalInjector;
