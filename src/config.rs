use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mixer::MixerGeometry;
use crate::pid::PidGains;
use crate::types::Axis;

/// Gains of one cascade stage, one set per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisGains {
    pub roll: PidGains,
    pub pitch: PidGains,
    pub yaw: PidGains,
}

impl AxisGains {
    pub const fn new(roll: PidGains, pitch: PidGains, yaw: PidGains) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn get(&self, axis: Axis) -> &PidGains {
        match axis {
            Axis::Roll => &self.roll,
            Axis::Pitch => &self.pitch,
            Axis::Yaw => &self.yaw,
        }
    }
}

/// Tuning and airframe constants of the attitude/rate cascade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Control tick frequency (Hz).
    pub loop_rate_hz: f32,
    /// Fraction of the yaw error the attitude loop tracks, 0 ignores yaw.
    pub yaw_weight: f32,
    /// Power floor of every rotor, keeps the props spinning for authority.
    pub minimal_thrust: f32,
    /// Inner loop gains, rad/s error to virtual thrust.
    pub rate: AxisGains,
    /// Outer loop gains, rad error to rad/s target rate.
    pub angle: AxisGains,
    pub mixer: MixerGeometry,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            loop_rate_hz: 500.0,
            yaw_weight: 0.4,
            minimal_thrust: 0.05,
            rate: AxisGains::new(
                PidGains::pid(0.05, 0.02, 0.001).with_integral_limit(0.1),
                PidGains::pid(0.05, 0.02, 0.001).with_integral_limit(0.1),
                PidGains::pid(0.5, 0.05, 0.0).with_integral_limit(0.1),
            ),
            angle: AxisGains::new(PidGains::p(4.0), PidGains::p(4.0), PidGains::p(2.0)),
            mixer: MixerGeometry::QUAD_X,
        }
    }
}

impl ControlConfig {
    /// Control period in seconds.
    pub fn dt(&self) -> f32 {
        1.0 / self.loop_rate_hz
    }

    /// Parses and validates a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: ControlConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        info!("control config loaded, loop rate {} Hz", config.loop_rate_hz);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.loop_rate_hz.is_finite() && self.loop_rate_hz > 0.0) {
            return Err(ConfigError::invalid("loop_rate_hz", "must be positive and finite"));
        }
        if !(0.0..=1.0).contains(&self.yaw_weight) {
            return Err(ConfigError::invalid("yaw_weight", "must lie in [0, 1]"));
        }
        if !(0.0..1.0).contains(&self.minimal_thrust) {
            return Err(ConfigError::invalid("minimal_thrust", "must lie in [0, 1)"));
        }

        for axis in Axis::ALL {
            check_gains(self.rate.get(axis), "rate")?;
            check_gains(self.angle.get(axis), "angle")?;

            let angle = self.angle.get(axis);
            if angle.ki != 0.0 || angle.kd != 0.0 {
                warn!(
                    "angle stage {} has I/D gains, they act on zero inputs",
                    axis.index()
                );
            }
        }

        if self.mixer.0.iter().flatten().any(|c| !c.is_finite()) {
            return Err(ConfigError::invalid("mixer", "coefficients must be finite"));
        }

        Ok(())
    }
}

fn check_gains(gains: &PidGains, stage: &'static str) -> Result<(), ConfigError> {
    let values = [
        gains.kp,
        gains.ki,
        gains.kd,
        gains.integral_limit,
        gains.output_limit,
    ];
    if values.iter().all(|v| v.is_finite() && *v >= 0.0) {
        Ok(())
    } else {
        Err(ConfigError::invalid(stage, "gains and limits must be finite and non-negative"))
    }
}
