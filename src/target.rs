use std::sync::Arc;

use nalgebra::{UnitQuaternion, Vector3};
use parking_lot::Mutex;

use crate::types::{Axis, AxisMode, AxisModes};

/// Setpoints of the cascade.
///
/// Written by the command source (sticks, guidance). Inside a control tick only
/// the attitude loop writes to it, replacing the target rate of axes in
/// [`AxisMode::Angle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetState {
    rate: Vector3<f32>,
    attitude: UnitQuaternion<f32>,
    thrust: f32,
    modes: AxisModes,
}

impl Default for TargetState {
    fn default() -> Self {
        Self {
            rate: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
            thrust: 0.5,
            modes: AxisModes::default(),
        }
    }
}

impl TargetState {
    pub fn target_rate(&self) -> Vector3<f32> {
        self.rate
    }

    pub fn target_attitude(&self) -> UnitQuaternion<f32> {
        self.attitude
    }

    pub fn target_thrust(&self) -> f32 {
        self.thrust
    }

    pub fn axis_mode(&self, axis: Axis) -> AxisMode {
        self.modes[axis]
    }

    pub fn modes(&self) -> AxisModes {
        self.modes
    }

    /// Body rate setpoint (rad/s). Axes in angle mode overwrite their
    /// component on the next tick.
    pub fn set_target_rate(&mut self, rate: Vector3<f32>) {
        self.rate = rate;
    }

    pub fn set_target_attitude(&mut self, attitude: UnitQuaternion<f32>) {
        self.attitude = attitude;
    }

    /// Collective thrust in [0, 1]. Out-of-range values are clamped, a
    /// non-finite value leaves the previous target in place.
    pub fn set_target_thrust(&mut self, thrust: f32) {
        if !thrust.is_finite() {
            warn!("ignoring non-finite thrust target");
            return;
        }
        self.thrust = thrust.clamp(0.0, 1.0);
    }

    pub fn set_axis_mode(&mut self, axis: Axis, mode: AxisMode) {
        self.modes[axis] = mode;
    }

    pub fn set_modes(&mut self, modes: AxisModes) {
        self.modes = modes;
    }

    pub(crate) fn set_rate_component(&mut self, axis: Axis, rate: f32) {
        self.rate[axis.index()] = rate;
    }
}

/// Target state shared between the command source and the control tick.
///
/// Every access holds the lock for the whole value, so the tick never sees an
/// attitude quaternion with only some of its components updated.
#[derive(Clone, Debug, Default)]
pub struct SharedTarget {
    inner: Arc<Mutex<TargetState>>,
}

impl SharedTarget {
    pub fn new(target: TargetState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(target)),
        }
    }

    pub fn snapshot(&self) -> TargetState {
        *self.inner.lock()
    }

    /// Runs `f` with exclusive access to the target state.
    pub fn update<R>(&self, f: impl FnOnce(&mut TargetState) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }
}
