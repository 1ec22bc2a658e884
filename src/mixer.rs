use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::types::{Rotor, RotorPowers};

/// Per-rotor `[roll, pitch, yaw]` mixing coefficients, in [`Rotor`] order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MixerGeometry(pub [[f32; 3]; 4]);

impl MixerGeometry {
    /// X-quad with front-left/back-right spinning against the yaw direction.
    pub const QUAD_X: MixerGeometry = MixerGeometry([
        [1.0, -1.0, -1.0], // front right
        [-1.0, 1.0, -1.0], // back left
        [1.0, 1.0, 1.0],   // front left
        [-1.0, -1.0, 1.0], // back right
    ]);

    pub fn coefficients(&self, rotor: Rotor) -> Vector3<f32> {
        Vector3::from(self.0[rotor.index()])
    }
}

impl Default for MixerGeometry {
    fn default() -> Self {
        MixerGeometry::QUAD_X
    }
}

/// Linear combination of the virtual thrust vector for every rotor, before
/// any offset or saturation handling.
pub fn mix(geometry: &MixerGeometry, thrust_vector: &Vector3<f32>) -> RotorPowers {
    let mut raw = RotorPowers::default();
    for rotor in Rotor::ALL {
        raw[rotor] = geometry.coefficients(rotor).dot(thrust_vector);
    }
    raw
}

/// Places the raw mix inside `[minimal_thrust, 1]`.
///
/// When the spread between rotors fits in the available headroom, the whole
/// set is shifted so the least loaded rotor sits at the target thrust (limited
/// so nothing exceeds 1). Otherwise the spread is scaled down to exactly the
/// headroom and anchored at `minimal_thrust`: torque ratios win over throttle.
pub fn allocate(raw: &RotorPowers, target_thrust: f32, minimal_thrust: f32) -> RotorPowers {
    let min = raw.min();
    let span = raw.max() - min;
    let headroom = 1.0 - minimal_thrust;

    let mut out = *raw;
    if span > headroom {
        let multiplier = headroom / span;
        debug!("mixer saturated: span {} > headroom {}", span, headroom);
        for p in out.0.iter_mut() {
            *p = (*p - min) * multiplier + minimal_thrust;
        }
    } else {
        let adder = target_thrust.min(1.0 - span).max(minimal_thrust);
        for p in out.0.iter_mut() {
            *p = (*p - min) + adder;
        }
    }

    // Rounding can leave the top rotor a few ulps above 1.
    for p in out.0.iter_mut() {
        *p = p.min(1.0).max(minimal_thrust);
    }
    out
}

/// Maps the virtual thrust vector and collective thrust onto rotor powers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mixer {
    pub geometry: MixerGeometry,
    pub minimal_thrust: f32,
}

impl Mixer {
    pub fn new(geometry: MixerGeometry, minimal_thrust: f32) -> Self {
        Self {
            geometry,
            minimal_thrust,
        }
    }

    pub fn apply(&self, thrust_vector: &Vector3<f32>, target_thrust: f32) -> RotorPowers {
        let raw = mix(&self.geometry, thrust_vector);
        allocate(&raw, target_thrust, self.minimal_thrust)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_THRUST: f32 = 0.05;
    const EPS: f32 = 1e-5;

    fn mixer() -> Mixer {
        Mixer::new(MixerGeometry::QUAD_X, MIN_THRUST)
    }

    fn assert_powers(actual: RotorPowers, expected: [f32; 4]) {
        for (a, e) in actual.0.iter().zip(expected.iter()) {
            assert!((a - e).abs() < EPS, "expected {:?}, got {:?}", expected, actual);
        }
    }

    #[test]
    fn test_level_hover() {
        let out = mixer().apply(&Vector3::zeros(), 0.5);
        assert_powers(out, [0.5; 4]);
    }

    #[test]
    fn test_pure_roll_command() {
        let out = mixer().apply(&Vector3::new(0.2, 0.0, 0.0), 0.5);
        assert!((out[Rotor::FrontRight] - 0.9).abs() < EPS);
        assert!((out[Rotor::BackLeft] - 0.5).abs() < EPS);
        assert!((out[Rotor::FrontLeft] - 0.9).abs() < EPS);
        assert!((out[Rotor::BackRight] - 0.5).abs() < EPS);
    }

    #[test]
    fn test_mix_signs() {
        let raw = mix(&MixerGeometry::QUAD_X, &Vector3::new(0.0, 0.1, 0.0));
        assert_powers(raw, [-0.1, 0.1, 0.1, -0.1]);

        let raw = mix(&MixerGeometry::QUAD_X, &Vector3::new(0.0, 0.0, 0.1));
        assert_powers(raw, [-0.1, -0.1, 0.1, 0.1]);
    }

    #[test]
    fn test_saturated_span_rescaled_and_anchored() {
        // span 1.2 > headroom 0.95
        let thrust_vector = Vector3::new(0.3, 0.0, 0.3);
        let raw = mix(&MixerGeometry::QUAD_X, &thrust_vector);
        assert!((raw.span() - 1.2).abs() < EPS);

        let out = allocate(&raw, 0.5, MIN_THRUST);
        assert!((out.span() - 0.95).abs() < EPS);
        assert!((out.min() - MIN_THRUST).abs() < EPS);
        assert!(out.max() <= 1.0);
    }

    #[test]
    fn test_saturation_preserves_ordering() {
        let raw = mix(&MixerGeometry::QUAD_X, &Vector3::new(0.9, -0.4, 0.25));
        let out = allocate(&raw, 0.3, MIN_THRUST);

        for i in Rotor::ALL {
            for j in Rotor::ALL {
                if raw[i] < raw[j] {
                    assert!(out[i] <= out[j], "{:?} vs {:?}: {:?}", i, j, out);
                }
            }
        }
    }

    #[test]
    fn test_unsaturated_span_preserved() {
        let raw = mix(&MixerGeometry::QUAD_X, &Vector3::new(0.05, 0.1, -0.02));
        let out = allocate(&raw, 0.4, MIN_THRUST);
        assert!((out.span() - raw.span()).abs() < EPS);
        assert!((out.min() - 0.4).abs() < EPS);
    }

    #[test]
    fn test_high_thrust_limited_by_top_rotor() {
        let out = mixer().apply(&Vector3::new(0.1, 0.0, 0.0), 1.0);
        assert!((out.max() - 1.0).abs() < EPS);
        assert!((out.min() - 0.8).abs() < EPS);
    }

    #[test]
    fn test_zero_thrust_floors_at_minimum() {
        let out = mixer().apply(&Vector3::new(0.0, 0.0, 0.1), 0.0);
        assert!((out.min() - MIN_THRUST).abs() < EPS);
        assert!((out.max() - (MIN_THRUST + 0.2)).abs() < EPS);
    }

    #[test]
    fn test_output_always_within_bounds() {
        let components = [-3.0, -0.7, -0.1, 0.0, 0.05, 0.33, 1.0, 12.0];
        let thrusts = [0.0, 0.2, 0.5, 0.95, 1.0];

        for &x in components.iter() {
            for &y in components.iter() {
                for &z in components.iter() {
                    for &t in thrusts.iter() {
                        let out = mixer().apply(&Vector3::new(x, y, z), t);
                        for (rotor, p) in out.iter() {
                            assert!(
                                (MIN_THRUST..=1.0).contains(&p),
                                "{:?} out of bounds: {} for ({}, {}, {}) @ {}",
                                rotor, p, x, y, z, t
                            );
                        }
                    }
                }
            }
        }
    }
}
