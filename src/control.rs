use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::config::ControlConfig;
use crate::error::ConfigError;
use crate::geometry::{dcm_z, from2vec, is_thrust_reversal};
use crate::hal::{Ahrs, Estimate, Motor};
use crate::mixer::Mixer;
use crate::pid::Pid;
use crate::target::TargetState;
use crate::types::{Axis, AxisMode, RotorPowers};

/// Cascaded attitude/rate controller for an X-quad.
///
/// Every control tick runs three stages, each consuming the output of the one
/// before it:
///
/// 1. Attitude control (outer loop) - tilt-prioritized quaternion error to target body rates
/// 2. Body rate control (inner loop) - rate error to a virtual thrust (torque) vector
/// 3. Motor mixing - virtual thrust vector and collective thrust to four rotor powers
///
/// # Control Architecture
///
/// Target Attitude → Attitude Controller → Target Rates (angle-mode axes)
///                                                ↓
/// Target Rates (rate-mode axes) ────────→ Body Rate Controller → Virtual Thrust Vector
///                                                                       ↓
/// Target Thrust ────────────────────────────────────────────────→ Motor Mixing → Rotor Powers
///
/// Each stage owns one PID per axis; no accumulator is shared between axes or
/// stages.
pub struct FlightController {
    config: ControlConfig,
    /// Inner loop PIDs [roll, pitch, yaw]
    rate_pids: [Pid; 3],
    /// Outer loop PIDs [roll, pitch, yaw], fed proportional-only inputs
    angle_pids: [Pid; 3],
    mixer: Mixer,
    /// Virtual thrust vector produced by the last rate stage
    thrust_vector: Vector3<f32>,
}

impl FlightController {
    /// Creates a controller from a validated configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Gains, loop rate, yaw weight, thrust floor and mixer table
    ///
    /// # Returns
    ///
    /// The controller with all PID state cleared, or the reason the
    /// configuration was rejected.
    ///
    /// # Example
    ///
    /// let mut controller = FlightController::new(ControlConfig::default())?;
    /// let powers = controller.tick(&estimate, &mut target, &mut motors);
    ///
    pub fn new(config: ControlConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let dt = config.dt();
        let rate_pids = Axis::ALL.map(|axis| Pid::new(*config.rate.get(axis), dt));
        let angle_pids = Axis::ALL.map(|axis| Pid::new(*config.angle.get(axis), dt));
        let mixer = Mixer::new(config.mixer, config.minimal_thrust);

        Ok(Self {
            config,
            rate_pids,
            angle_pids,
            mixer,
            thrust_vector: Vector3::zeros(),
        })
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Replaces gains, yaw weight, thrust floor and mixer table in flight.
    ///
    /// Integrators keep their values, so retuning does not bump the vehicle.
    /// The loop rate is fixed at construction; a different `loop_rate_hz` is
    /// rejected.
    pub fn set_config(&mut self, config: ControlConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config.loop_rate_hz != self.config.loop_rate_hz {
            return Err(ConfigError::invalid(
                "loop_rate_hz",
                "cannot change while the controller is running",
            ));
        }

        for axis in Axis::ALL {
            self.rate_pids[axis.index()].set_gains(*config.rate.get(axis));
            self.angle_pids[axis.index()].set_gains(*config.angle.get(axis));
        }
        self.mixer = Mixer::new(config.mixer, config.minimal_thrust);
        self.config = config;
        Ok(())
    }

    /// Virtual thrust vector [roll, pitch, yaw] of the last tick.
    pub fn thrust_vector(&self) -> Vector3<f32> {
        self.thrust_vector
    }

    /// Clears every integrator and derivative history, e.g. on arming.
    pub fn reset(&mut self) {
        for pid in self.rate_pids.iter_mut().chain(self.angle_pids.iter_mut()) {
            pid.reset();
        }
        self.thrust_vector = Vector3::zeros();
    }

    /// Outer loop: drives the attitude error of every angle-mode axis to zero.
    ///
    /// The error comes from [`attitude_error`] with the configured yaw weight.
    /// Each angle-mode axis feeds its error component into its angle PID with
    /// no derivative input and no setpoint weight, and the result becomes that
    /// axis's target rate. Rate-mode axes keep the externally commanded rate.
    ///
    /// # Arguments
    ///
    /// * `attitude` - Current body-to-world attitude
    /// * `target` - Setpoints; the target rate of angle-mode axes is overwritten
    ///
    /// # Returns
    ///
    /// The attitude error (rad, body frame) the outer loop acted on
    pub fn attitude_control(
        &mut self,
        attitude: &UnitQuaternion<f32>,
        target: &mut TargetState,
    ) -> Vector3<f32> {
        let qd = target.target_attitude();
        let error = attitude_error(attitude, &qd, self.config.yaw_weight);

        for axis in Axis::ALL {
            if target.axis_mode(axis) == AxisMode::Angle {
                let rate = self.angle_pids[axis.index()].calculate(error[axis.index()], 0.0, 0.0);
                target.set_rate_component(axis, rate);
            }
        }

        error
    }

    /// Inner loop: turns body rate error into the virtual thrust vector.
    ///
    /// The measured angular acceleration is the derivative input of each rate
    /// PID, so setpoint steps and gyro noise are not differentiated.
    ///
    /// # Arguments
    ///
    /// * `rate` - Measured body rates [p, q, r] in rad/s
    /// * `acceleration` - Measured body angular acceleration in rad/s²
    /// * `target_rate` - Desired body rates in rad/s
    ///
    /// # Returns
    ///
    /// Virtual thrust vector [roll, pitch, yaw], unit-less
    pub fn rate_control(
        &mut self,
        rate: &Vector3<f32>,
        acceleration: &Vector3<f32>,
        target_rate: &Vector3<f32>,
    ) -> Vector3<f32> {
        let mut thrust_vector = Vector3::zeros();

        for axis in Axis::ALL {
            let i = axis.index();
            let error = target_rate[i] - rate[i];
            thrust_vector[i] = self.rate_pids[i].calculate(error, acceleration[i], 0.0);
        }

        self.thrust_vector = thrust_vector;
        thrust_vector
    }

    /// Maps a virtual thrust vector and collective thrust to rotor powers.
    pub fn mix(&self, thrust_vector: &Vector3<f32>, target_thrust: f32) -> RotorPowers {
        self.mixer.apply(thrust_vector, target_thrust)
    }

    /// Runs one control period.
    ///
    /// Samples the estimator once, then runs attitude control, rate control
    /// and mixing in that order, and hands every rotor its power exactly once.
    ///
    /// # Arguments
    ///
    /// * `ahrs` - Attitude estimator
    /// * `target` - Setpoints from the command source
    /// * `motor` - Actuator driver receiving the four powers
    ///
    /// # Returns
    ///
    /// The powers written to `motor`, each in `[minimal_thrust, 1]`
    pub fn tick<A, M>(&mut self, ahrs: &A, target: &mut TargetState, motor: &mut M) -> RotorPowers
    where
        A: Ahrs + ?Sized,
        M: Motor + ?Sized,
    {
        let estimate = Estimate::sample(ahrs);

        self.attitude_control(&estimate.attitude, target);
        let thrust_vector = self.rate_control(
            &estimate.rate,
            &estimate.angular_acceleration,
            &target.target_rate(),
        );
        let powers = self.mix(&thrust_vector, target.target_thrust());

        for (rotor, power) in powers.iter() {
            motor.set_power(rotor, power);
        }
        trace!(
            "tick powers {} {} {} {}",
            powers.0[0],
            powers.0[1],
            powers.0[2],
            powers.0[3]
        );

        powers
    }
}

/// Reduced desired attitude that matches the desired thrust axis while
/// keeping the current heading.
///
/// The shortest rotation between the current and desired body z axes is
/// applied to the current attitude. When the two axes point in opposite
/// directions that rotation has no usable yaw content, so the full desired
/// attitude is returned instead and the flag is `true`.
pub fn reduced_attitude(
    attitude: &UnitQuaternion<f32>,
    qd: &UnitQuaternion<f32>,
) -> (UnitQuaternion<f32>, bool) {
    let e_z = dcm_z(attitude);
    let e_z_d = dcm_z(qd);

    match from2vec(&e_z, &e_z_d) {
        Ok(q_tilt) if !is_thrust_reversal(q_tilt.quaternion()) => (q_tilt * attitude, false),
        Ok(_) => {
            debug!("thrust axis reversal, tracking full attitude");
            (*qd, true)
        }
        Err(_) => {
            debug!("thrust axes exactly opposite, tracking full attitude");
            (*qd, true)
        }
    }
}

/// Tilt-prioritized attitude error (rad, body frame).
///
/// Roll and pitch are tracked fully; only `yaw_weight` of the remaining yaw
/// difference is blended back in, so large heading errors never take
/// authority away from leveling. The result is twice the vector part of the
/// rotation from `attitude` to the blended target, negated when the scalar
/// part of `attitude` is negative so the shorter way around is taken. Either
/// sign of `attitude` or `qd` yields the same error.
pub fn attitude_error(
    attitude: &UnitQuaternion<f32>,
    qd: &UnitQuaternion<f32>,
    yaw_weight: f32,
) -> Vector3<f32> {
    let qd = if qd.w < 0.0 {
        UnitQuaternion::new_unchecked(-qd.into_inner())
    } else {
        *qd
    };
    let (mut q_tilt, _) = reduced_attitude(attitude, &qd);

    // Keep q_mix on the positive hemisphere so the weighted yaw is the short
    // way around. q_tilt * q_mix still equals qd.
    let mut q_mix = (q_tilt.inverse() * qd).into_inner();
    if q_mix.w < 0.0 {
        q_mix = -q_mix;
        q_tilt = UnitQuaternion::new_unchecked(-q_tilt.into_inner());
    }

    // acos/asin domain: drift can push these a hair past 1
    let w = q_mix.w.clamp(-1.0, 1.0);
    let z = q_mix.k.clamp(-1.0, 1.0);

    let yaw = Quaternion::new(
        (yaw_weight * w.acos()).cos(),
        0.0,
        0.0,
        (yaw_weight * z.asin()).sin(),
    );
    let qd_final = q_tilt.into_inner() * yaw;

    let error = (attitude.conjugate().into_inner() * qd_final).imag() * 2.0;
    if attitude.w < 0.0 {
        -error
    } else {
        error
    }
}
