use serde::{Deserialize, Serialize};

/// Gains and limits of one single-axis PID.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Symmetric clamp of the integral term. Zero leaves it unbounded.
    pub integral_limit: f32,
    /// Symmetric clamp of the total output. Zero leaves it unbounded.
    pub output_limit: f32,
}

impl PidGains {
    /// Proportional-only gains.
    pub const fn p(kp: f32) -> Self {
        Self {
            kp,
            ki: 0.0,
            kd: 0.0,
            integral_limit: 0.0,
            output_limit: 0.0,
        }
    }

    pub const fn pid(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral_limit: 0.0,
            output_limit: 0.0,
        }
    }

    pub const fn with_integral_limit(mut self, limit: f32) -> Self {
        self.integral_limit = limit;
        self
    }

    pub const fn with_output_limit(mut self, limit: f32) -> Self {
        self.output_limit = limit;
        self
    }
}

/// Single-axis PID with setpoint weighting on the derivative term.
///
/// The derivative is built from a caller-supplied measurement of the process
/// derivative `m` (for a rate loop, the measured angular acceleration) and the
/// finite difference of the error:
///
/// D = kd * (c * (de/dt + m) - m)
///
/// With `c = 0` this is derivative-on-measurement and setpoint steps never
/// kick the output; with `c = 0` and `m = 0` the term vanishes.
#[derive(Clone, Debug)]
pub struct Pid {
    gains: PidGains,
    dt: f32,
    integral: f32,
    prev_error: Option<f32>,
}

impl Pid {
    pub fn new(gains: PidGains, dt: f32) -> Self {
        Self {
            gains,
            dt,
            integral: 0.0,
            prev_error: None,
        }
    }

    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Advances the controller by one period and returns its output.
    pub fn calculate(&mut self, error: f32, derivative_measurement: f32, setpoint_weight: f32) -> f32 {
        let g = &self.gains;

        if g.ki != 0.0 {
            self.integral += g.ki * error * self.dt;
            if g.integral_limit > 0.0 {
                self.integral = self.integral.clamp(-g.integral_limit, g.integral_limit);
            }
        }

        let error_rate = match self.prev_error {
            Some(prev) if self.dt > 0.0 => (error - prev) / self.dt,
            _ => 0.0,
        };
        self.prev_error = Some(error);

        let derivative = setpoint_weight * (error_rate + derivative_measurement) - derivative_measurement;
        let output = g.kp * error + self.integral + g.kd * derivative;

        if g.output_limit > 0.0 {
            output.clamp(-g.output_limit, g.output_limit)
        } else {
            output
        }
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}
