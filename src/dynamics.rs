use fast_ode;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::hal::{Ahrs, Motor};
use crate::mixer::MixerGeometry;
use crate::types::{Rotor, RotorPowers};

/// Rigid-body state of the simulated vehicle.
///
/// # Fields
///
/// * `position` - Position in the world frame, z up (m)
/// * `velocity` - Velocity in the world frame (m/s)
/// * `attitude` - Body-to-world rotation
/// * `rate` - Angular velocity in the body frame (rad/s)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct State {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub attitude: UnitQuaternion<f64>,
    pub rate: Vector3<f64>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
            rate: Vector3::zeros(),
        }
    }
}

impl State {
    /// Flattens the state for the integrator.
    ///
    /// # Returns
    ///
    /// A 13-element array:
    /// [pos_x, pos_y, pos_z, vel_x, vel_y, vel_z, q_w, q_x, q_y, q_z, p, q, r]
    pub fn to_array(&self) -> [f64; 13] {
        let q = self.attitude.quaternion();
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
            q.w,
            q.i,
            q.j,
            q.k,
            self.rate.x,
            self.rate.y,
            self.rate.z,
        ]
    }

    /// Rebuilds a state from the layout of [`State::to_array`]. The attitude
    /// is renormalized to remove integration drift.
    pub fn from_array(arr: &[f64; 13]) -> Self {
        State {
            position: Vector3::new(arr[0], arr[1], arr[2]),
            velocity: Vector3::new(arr[3], arr[4], arr[5]),
            attitude: UnitQuaternion::from_quaternion(Quaternion::new(
                arr[6], arr[7], arr[8], arr[9],
            )),
            rate: Vector3::new(arr[10], arr[11], arr[12]),
        }
    }
}

/// Physical constants and properties of the drone.
///
/// # Fields
///
/// * `g` - Gravitational acceleration (m/s²)
/// * `mass` - Total mass of the drone (kg)
/// * `ixx`, `iyy`, `izz` - Principal moments of inertia about body axes (kg⋅m²)
#[derive(Clone, Copy, Debug)]
pub struct Consts {
    pub g: f64,
    pub mass: f64,
    pub ixx: f64,
    pub iyy: f64,
    pub izz: f64,
}

impl Consts {
    fn inertia(&self) -> Vector3<f64> {
        Vector3::new(self.ixx, self.iyy, self.izz)
    }
}

/// How rotor powers turn into thrust and body torques.
///
/// Rotor `i` produces `max_thrust * power` along body z. Its torque about each
/// axis follows the mixer coefficient of that rotor and axis, scaled by
/// `arm_length` for roll/pitch and by `yaw_torque_coeff` for yaw, so the
/// plant responds to the same table the controller mixes with.
#[derive(Clone, Copy, Debug)]
pub struct Airframe {
    pub geometry: MixerGeometry,
    /// Thrust of one rotor at full power (N)
    pub max_thrust: f64,
    /// Effective lever arm for roll and pitch (m)
    pub arm_length: f64,
    /// Reaction torque per Newton of thrust (m)
    pub yaw_torque_coeff: f64,
}

impl Airframe {
    /// Collective thrust (N) and body torques (N⋅m) for a set of rotor powers.
    pub fn wrench(&self, powers: &RotorPowers) -> (f64, Vector3<f64>) {
        let mut thrust = 0.0;
        let mut torque = Vector3::zeros();

        for (rotor, power) in powers.iter() {
            let f = self.max_thrust * power as f64;
            let c = self.geometry.coefficients(rotor).cast::<f64>();
            thrust += f;
            torque += Vector3::new(
                c.x * self.arm_length,
                c.y * self.arm_length,
                c.z * self.yaw_torque_coeff,
            ) * f;
        }

        (thrust, torque)
    }
}

/// Ordinary Differential Equation (ODE) system for quadrotor rigid-body motion.
///
/// # Fields
///
/// * `consts` - Physical constants and drone properties
/// * `thrust` - Collective thrust along body z (N)
/// * `torques` - Applied torques about body axes (N⋅m)
pub struct DroneODE {
    pub consts: Consts,
    pub thrust: f64,
    pub torques: Vector3<f64>,
}

impl DroneODE {
    /// Euler's rotational equation, I⋅ω̇ = τ - ω × (I⋅ω).
    pub fn angular_acceleration(&self, rate: &Vector3<f64>) -> Vector3<f64> {
        let inertia = self.consts.inertia();
        let gyroscopic = rate.cross(&inertia.component_mul(rate));
        (self.torques - gyroscopic).component_div(&inertia)
    }
}

impl fast_ode::DifferentialEquation<13> for DroneODE {
    fn ode_dot_y(&self, _t: f64, y: &fast_ode::Coord<13>) -> (fast_ode::Coord<13>, bool) {
        let state = y.0;

        let q = Quaternion::new(state[6], state[7], state[8], state[9]);
        let rate = Vector3::new(state[10], state[11], state[12]);

        // Body thrust to world frame
        let attitude = UnitQuaternion::from_quaternion(q);
        let accel = attitude * Vector3::new(0.0, 0.0, self.thrust / self.consts.mass)
            - Vector3::new(0.0, 0.0, self.consts.g);

        // q̇ = ½ q ⊗ (0, ω)
        let q_dot = q * Quaternion::from_imag(rate) * 0.5;
        let rate_dot = self.angular_acceleration(&rate);

        let dot_y = [
            state[3],
            state[4],
            state[5],
            accel.x,
            accel.y,
            accel.z,
            q_dot.w,
            q_dot.i,
            q_dot.j,
            q_dot.k,
            rate_dot.x,
            rate_dot.y,
            rate_dot.z,
        ];

        (fast_ode::Coord(dot_y), true)
    }
}

/// Integrates the rigid body over `time_span` with constant thrust and torques.
///
/// # Arguments
///
/// * `initial_state` - Starting state of the drone
/// * `consts` - Physical parameters of the drone
/// * `thrust` - Collective thrust along body z (N)
/// * `torques` - Applied torques about body axes (N⋅m)
/// * `time_span` - Tuple (t_start, t_end) defining integration interval (seconds)
/// * `tolerance` - Absolute tolerance for the numerical integrator
///
/// # Returns
///
/// * `Ok(State)` - Final state after integration
/// * `Err(&str)` - Error message if integration fails
pub fn simulate_drone(
    initial_state: State,
    consts: Consts,
    thrust: f64,
    torques: Vector3<f64>,
    time_span: (f64, f64),
    tolerance: f64,
) -> Result<State, &'static str> {
    let ode = DroneODE {
        consts,
        thrust,
        torques,
    };

    let initial_coord = fast_ode::Coord(initial_state.to_array());

    let result = fast_ode::solve_ivp(
        &ode,
        time_span,
        initial_coord,
        |_, _| true,
        tolerance,
        tolerance * 10.0,
    );

    match result {
        fast_ode::IvpResult::FinalTimeReached(final_coord) => Ok(State::from_array(&final_coord.0)),
        _ => Err("Integration failed"),
    }
}

/// Simulated vehicle standing in for the estimator and the motor driver.
///
/// The AHRS side reports the true state; angular acceleration is evaluated
/// from the torques of the powers applied during the last step.
pub struct Plant {
    pub state: State,
    pub consts: Consts,
    pub airframe: Airframe,
    powers: RotorPowers,
    angular_acceleration: Vector3<f64>,
    tolerance: f64,
}

impl Plant {
    pub fn new(state: State, consts: Consts, airframe: Airframe) -> Self {
        Self {
            state,
            consts,
            airframe,
            powers: RotorPowers::default(),
            angular_acceleration: Vector3::zeros(),
            tolerance: 1e-6,
        }
    }

    pub fn powers(&self) -> RotorPowers {
        self.powers
    }

    /// Holds the current rotor powers for `dt` seconds.
    pub fn step(&mut self, dt: f64) -> Result<(), &'static str> {
        let (thrust, torques) = self.airframe.wrench(&self.powers);
        self.state = simulate_drone(
            self.state,
            self.consts,
            thrust,
            torques,
            (0.0, dt),
            self.tolerance,
        )?;

        let ode = DroneODE {
            consts: self.consts,
            thrust,
            torques,
        };
        self.angular_acceleration = ode.angular_acceleration(&self.state.rate);
        Ok(())
    }
}

impl Ahrs for Plant {
    fn measured_rate(&self) -> Vector3<f32> {
        self.state.rate.cast::<f32>()
    }

    fn measured_angular_acceleration(&self) -> Vector3<f32> {
        self.angular_acceleration.cast::<f32>()
    }

    fn measured_attitude(&self) -> UnitQuaternion<f32> {
        self.state.attitude.cast::<f32>()
    }
}

impl Motor for Plant {
    fn set_power(&mut self, rotor: Rotor, power: f32) {
        self.powers[rotor] = power;
    }
}
