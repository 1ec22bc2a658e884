//! Boundaries to the attitude estimator and the motor driver.

use nalgebra::{UnitQuaternion, Vector3};

use crate::types::{Rotor, RotorPowers};

/// Attitude and heading reference system feeding the cascade.
pub trait Ahrs {
    /// Body angular velocity (rad/s).
    fn measured_rate(&self) -> Vector3<f32>;
    /// Body angular acceleration (rad/s²).
    fn measured_angular_acceleration(&self) -> Vector3<f32>;
    /// Body-to-world attitude.
    fn measured_attitude(&self) -> UnitQuaternion<f32>;
}

/// Actuator driver taking a normalized power per rotor.
pub trait Motor {
    fn set_power(&mut self, rotor: Rotor, power: f32);
}

/// Estimator output sampled once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate {
    pub rate: Vector3<f32>,
    pub angular_acceleration: Vector3<f32>,
    pub attitude: UnitQuaternion<f32>,
}

impl Estimate {
    pub fn sample<A: Ahrs + ?Sized>(ahrs: &A) -> Self {
        Self {
            rate: ahrs.measured_rate(),
            angular_acceleration: ahrs.measured_angular_acceleration(),
            attitude: ahrs.measured_attitude(),
        }
    }

    /// At rest in the given attitude.
    pub fn at_rest(attitude: UnitQuaternion<f32>) -> Self {
        Self {
            rate: Vector3::zeros(),
            angular_acceleration: Vector3::zeros(),
            attitude,
        }
    }
}

impl Default for Estimate {
    fn default() -> Self {
        Self::at_rest(UnitQuaternion::identity())
    }
}

impl Ahrs for Estimate {
    fn measured_rate(&self) -> Vector3<f32> {
        self.rate
    }

    fn measured_angular_acceleration(&self) -> Vector3<f32> {
        self.angular_acceleration
    }

    fn measured_attitude(&self) -> UnitQuaternion<f32> {
        self.attitude
    }
}

impl Motor for RotorPowers {
    fn set_power(&mut self, rotor: Rotor, power: f32) {
        self[rotor] = power;
    }
}
