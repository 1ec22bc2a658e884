use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::error::GeometryError;

/// Threshold on the tilt rotation's x/y components above which the current and
/// desired thrust axes are treated as pointing in opposite directions.
pub const THRUST_REVERSAL_LIMIT: f32 = 1.0 - 1e-5;

/// Norm below which the unnormalized minimal rotation is considered zero.
const DEGENERATE_NORM: f32 = 1e-12;

/// Body z axis (thrust direction) of `q` expressed in the world frame.
///
/// This is the third column of the rotation matrix of `q`. The result is unit
/// length only if `q` is; no renormalization takes place.
pub fn dcm_z(q: &UnitQuaternion<f32>) -> Vector3<f32> {
    let (a, b, c, d) = (q.w, q.i, q.j, q.k);
    Vector3::new(
        2.0 * (a * c + b * d),
        2.0 * (c * d - a * b),
        a * a - b * b - c * c + d * d,
    )
}

/// Shortest-arc rotation taking `u` onto `v`.
///
/// Uses `w = u·v + sqrt(|u|²|v|²)`, `xyz = u × v` followed by normalization,
/// which stays accurate for small angles. Anti-parallel inputs leave both parts
/// at zero; that case has no unique rotation axis and is reported as
/// [`GeometryError::DegenerateRotation`].
pub fn from2vec(
    u: &Vector3<f32>,
    v: &Vector3<f32>,
) -> Result<UnitQuaternion<f32>, GeometryError> {
    let w = u.dot(v) + (u.norm_squared() * v.norm_squared()).sqrt();
    let axis = u.cross(v);
    let q = Quaternion::new(w, axis.x, axis.y, axis.z);

    UnitQuaternion::try_new(q, DEGENERATE_NORM).ok_or(GeometryError::DegenerateRotation)
}

/// Whether a tilt rotation from [`from2vec`] is a near 180° flip about a
/// horizontal axis, in which case its yaw content is meaningless.
pub fn is_thrust_reversal(q_tilt: &Quaternion<f32>) -> bool {
    q_tilt.i.abs() > THRUST_REVERSAL_LIMIT || q_tilt.j.abs() > THRUST_REVERSAL_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_dcm_z_identity() {
        let z = dcm_z(&UnitQuaternion::identity());
        assert_eq!(z, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_dcm_z_unit_norm() {
        let samples = [
            UnitQuaternion::from_euler_angles(0.3, -0.2, 1.0),
            UnitQuaternion::from_euler_angles(-2.5, 1.2, -0.4),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5 * PI),
            UnitQuaternion::from_quaternion(Quaternion::new(-0.4, 0.1, 0.7, -0.2)),
        ];

        for q in samples.iter() {
            let n = dcm_z(q).norm();
            assert!((n - 1.0).abs() < 1e-5, "norm was {}", n);
        }
    }

    #[test]
    fn test_dcm_z_matches_rotation_matrix() {
        let q = UnitQuaternion::from_euler_angles(0.4, 0.1, -0.7);
        let expected = q.to_rotation_matrix().matrix().column(2).into_owned();
        assert!((dcm_z(&q) - expected).norm() < 1e-6);
    }

    #[test]
    fn test_from2vec_same_vector_is_identity() {
        let u = Vector3::new(0.3, -0.4, 0.866).normalize();
        let q = from2vec(&u, &u).unwrap();
        assert!((q.w - 1.0).abs() < 1e-6);
        assert!(q.imag().norm() < 1e-6);
    }

    #[test]
    fn test_from2vec_rotates_u_onto_v() {
        let u = Vector3::new(0.0, 0.0, 1.0);
        let v = Vector3::new(1.0, 0.0, 1.0).normalize();
        let q = from2vec(&u, &v).unwrap();

        assert!((q * u - v).norm() < 1e-6);
        assert!((q.angle() - 0.25 * PI).abs() < 1e-5);
    }

    #[test]
    fn test_from2vec_antiparallel_is_degenerate() {
        let u = Vector3::new(0.0, 0.0, 1.0);
        let result = from2vec(&u, &-u);
        assert_eq!(result, Err(GeometryError::DegenerateRotation));
    }

    #[test]
    fn test_thrust_reversal_guard() {
        assert!(!is_thrust_reversal(&Quaternion::identity()));

        // Half a milliradian short of flipping about x.
        let e_z = Vector3::new(0.0, 0.0, 1.0);
        let flipped = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI - 1e-3);
        let q_tilt = from2vec(&e_z, &(flipped * e_z)).unwrap();
        assert!(is_thrust_reversal(q_tilt.quaternion()));

        let tilted = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5 * PI);
        let q_tilt = from2vec(&e_z, &(tilted * e_z)).unwrap();
        assert!(!is_thrust_reversal(q_tilt.quaternion()));
    }
}
