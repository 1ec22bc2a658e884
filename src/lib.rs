//! Flight-control core of a multirotor autopilot.
//!
//! Once per control tick the cascade turns target attitude, target body rate
//! and target thrust, together with the estimator's attitude and rates, into
//! four rotor powers:
//!
//! ```text
//! attitude loop ──► rate loop ──► mixer ──► Motor::set_power × 4
//!      ▲               ▲            ▲
//!  TargetState     Ahrs rates   target thrust
//! ```
//!
//! [`control::FlightController`] owns the per-axis PIDs of both stages and is
//! driven by an external scheduler through [`control::FlightController::tick`].
//! [`dynamics::Plant`] is a rigid-body quadrotor that implements both
//! collaborator traits for closed-loop simulation.

#[macro_use]
mod fmt;

pub mod config;
pub mod control;
pub mod dynamics;
pub mod error;
pub mod geometry;
pub mod hal;
pub mod mixer;
pub mod pid;
pub mod target;
pub mod types;

pub use config::{AxisGains, ControlConfig};
pub use control::FlightController;
pub use error::{ConfigError, GeometryError};
pub use hal::{Ahrs, Estimate, Motor};
pub use mixer::{Mixer, MixerGeometry};
pub use pid::{Pid, PidGains};
pub use target::{SharedTarget, TargetState};
pub use types::{Axis, AxisMode, AxisModes, Rotor, RotorPowers};
