// Per-object motion models and the fixed-tick driver

mod clock;
mod model;

pub use clock::{model_rng, ClockHandle, SimulationClock};
pub use model::{normalize_angle, KinematicModel, SensorState};
