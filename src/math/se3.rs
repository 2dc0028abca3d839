use nalgebra::{
    Isometry3,
    Matrix3,
    Quaternion,
    Translation3,
    UnitQuaternion,
    Vector3,
    Vector6
};

use crate::curve::coefficient::coefficient::Coefficient;
use crate::curve::curveerror::CurveError;

/// Rigid transformation T_A_B: pose of frame B expressed in frame A.
pub type SE3 = Isometry3<f64>;

pub type SO3 = UnitQuaternion<f64>;

/// Linear part in rows 0..3, angular part in rows 3..6.
pub type Twist = Vector6<f64>;

// 小於此角度時改用泰勒展開，避免 1 - cosθ 與 θ - sinθ 的相消誤差
const SERIES_ANGLE: f64 = 1e-3;

const UNIT_TOLERANCE: f64 = 1e-12;

// ─────────────────────────────────────────────────────────────────────────────
// SE(3) 指數 / 對數映射
// ─────────────────────────────────────────────────────────────────────────────
//
//   exp([ρ; ω]) = ( exp(ω^), J(ω)·ρ )
//   J(ω)   = I + a·W + b·W²
//   J⁻¹(ω) = I - W/2 + c·W²
//
//   a = (1-cosθ)/θ²           = 2·sin²(θ/2)/θ²       ≈ 1/2  - θ²/24
//   b = (θ-sinθ)/θ³                                  ≈ 1/6  - θ²/120
//   c = (1 - (θ/2)·cot(θ/2))/θ²                      ≈ 1/12 + θ²/720
//
// 其中 W = ω^（反對稱矩陣），θ = |ω|。

fn left_jacobian(omega: &Vector3<f64>) -> Matrix3<f64> {
    let theta = omega.norm();
    let theta2 = theta * theta;
    let w = omega.cross_matrix();
    let (a, b) = if theta < SERIES_ANGLE {
        (0.5 - theta2 / 24.0, 1.0 / 6.0 - theta2 / 120.0)
    } else {
        let half_sin = (0.5 * theta).sin();
        (2.0 * half_sin * half_sin / theta2, (theta - theta.sin()) / (theta2 * theta))
    };
    Matrix3::identity() + w * a + w * w * b
}

fn left_jacobian_inverse(omega: &Vector3<f64>) -> Matrix3<f64> {
    let theta = omega.norm();
    let theta2 = theta * theta;
    let w = omega.cross_matrix();
    let c = if theta < SERIES_ANGLE {
        1.0 / 12.0 + theta2 / 720.0
    } else {
        let half = 0.5 * theta;
        (1.0 - half * half.cos() / half.sin()) / theta2
    };
    Matrix3::identity() - w * 0.5 + w * w * c
}

pub fn exp(xi: &Twist) -> SE3 {
    let rho = Vector3::new(xi[0], xi[1], xi[2]);
    let omega = Vector3::new(xi[3], xi[4], xi[5]);
    let rotation = UnitQuaternion::from_scaled_axis(omega);
    let translation = left_jacobian(&omega) * rho;
    Isometry3::from_parts(Translation3::from(translation), rotation)
}

/// Rotation vector of `rotation`, with angle in [0, π].
///
/// 以 atan2 取角度；`UnitQuaternion::scaled_axis` 以 acos(w) 求角，小角度時精度不足。
pub fn log_rotation(rotation: &SO3) -> Vector3<f64> {
    let q = rotation.quaternion();
    let (w, v) = if q.w < 0.0 { (-q.w, -q.imag()) } else { (q.w, q.imag()) };
    let sin_half = v.norm();
    if sin_half < f64::EPSILON {
        v * (2.0 / w)
    } else {
        v * (2.0 * sin_half.atan2(w) / sin_half)
    }
}

pub fn log(transform: &SE3) -> Twist {
    let omega = log_rotation(&transform.rotation);
    let rho = left_jacobian_inverse(&omega) * transform.translation.vector;
    Twist::new(rho.x, rho.y, rho.z, omega.x, omega.y, omega.z)
}

pub fn linear_part(twist: &Twist) -> Vector3<f64> {
    Vector3::new(twist[0], twist[1], twist[2])
}

pub fn angular_part(twist: &Twist) -> Vector3<f64> {
    Vector3::new(twist[3], twist[4], twist[5])
}

/// Rotates both halves of a twist.
pub fn rotate_twist(rotation: &SO3, twist: &Twist) -> Twist {
    let linear = rotation * linear_part(twist);
    let angular = rotation * angular_part(twist);
    Twist::new(linear.x, linear.y, linear.z, angular.x, angular.y, angular.z)
}

impl Coefficient for SE3 {
    type Derivative = Twist;

    /// Screw-motion interpolation: `first · exp((1 - alpha) · log(first⁻¹ · second))`.
    fn interpolate(first: &Self, second: &Self, alpha: f64) -> Self {
        let delta = log(&(first.inverse() * second));
        first * exp(&(delta * (1.0 - alpha)))
    }

    /// Linear velocity `(p1 - p0) / dt` and angular velocity
    /// `log(R1 · R0⁻¹) / dt`, both expressed in the reference frame.
    fn finite_difference(first: &Self, second: &Self, dt: f64) -> Twist {
        let linear = (second.translation.vector - first.translation.vector) / dt;
        let angular = log_rotation(&(second.rotation * first.rotation.inverse())) / dt;
        Twist::new(linear.x, linear.y, linear.z, angular.x, angular.y, angular.z)
    }

    fn zero_derivative(&self) -> Twist {
        Twist::zeros()
    }

    /// `x y z qw qx qy qz`
    fn to_row(&self) -> Vec<f64> {
        let t = &self.translation.vector;
        let q = self.rotation.quaternion();
        vec![t.x, t.y, t.z, q.w, q.i, q.j, q.k]
    }

    fn from_row(row: &[f64]) -> Result<Self, CurveError> {
        if row.len() != 7 {
            return Err(CurveError::PreconditionViolation(format!(
                "a pose needs 7 values (x y z qw qx qy qz), got {}",
                row.len()
            )));
        }
        let translation = Translation3::new(row[0], row[1], row[2]);
        let quaternion = Quaternion::new(row[3], row[4], row[5], row[6]);
        let norm = quaternion.norm();
        if !norm.is_finite() || norm < UNIT_TOLERANCE {
            return Err(CurveError::PreconditionViolation(format!(
                "quaternion ({}, {}, {}, {}) cannot be normalized",
                row[3], row[4], row[5], row[6]
            )));
        }
        // 已是單位四元數（例如由 to_row 寫出）時原樣保留，確保讀回後數值不變
        let rotation = if (norm - 1.0).abs() <= UNIT_TOLERANCE {
            UnitQuaternion::new_unchecked(quaternion)
        } else {
            UnitQuaternion::from_quaternion(quaternion)
        };
        Ok(Isometry3::from_parts(translation, rotation))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    fn pose(x: f64, y: f64, z: f64, yaw: f64) -> SE3 {
        Isometry3::new(Vector3::new(x, y, z), Vector3::z() * yaw)
    }

    #[test]
    fn exp_inverts_log() {
        let transforms = [
            pose(1.0, -2.0, 0.5, 0.3),
            pose(0.0, 0.0, 0.0, 0.0),
            Isometry3::new(Vector3::new(0.2, 0.1, -3.0), Vector3::new(0.4, -1.1, 0.7)),
            Isometry3::new(Vector3::new(1e-3, 0.0, 0.0), Vector3::new(1e-10, 0.0, 0.0))
        ];
        for t in transforms.iter() {
            let back = exp(&log(t));
            assert_relative_eq!(back.translation.vector, t.translation.vector, epsilon = 1e-9);
            assert_relative_eq!(back.rotation.angle_to(&t.rotation), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn interpolation_hits_endpoints() {
        let a = pose(0.0, 0.0, 0.0, 0.0);
        let b = pose(2.0, 0.0, 0.0, FRAC_PI_2);
        let start = SE3::interpolate(&a, &b, 1.0);
        let end = SE3::interpolate(&a, &b, 0.0);
        assert_relative_eq!(start.translation.vector, a.translation.vector, epsilon = 1e-12);
        assert_relative_eq!(end.translation.vector, b.translation.vector, epsilon = 1e-9);
        assert_relative_eq!(end.rotation.angle_to(&b.rotation), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn pure_translation_interpolates_linearly() {
        let a = pose(0.0, 0.0, 0.0, 0.0);
        let b = pose(4.0, -2.0, 1.0, 0.0);
        let mid = SE3::interpolate(&a, &b, 0.75);
        assert_relative_eq!(mid.translation.vector, Vector3::new(1.0, -0.5, 0.25), epsilon = 1e-12);
    }

    #[test]
    fn rotation_interpolates_along_geodesic() {
        let a = pose(0.0, 0.0, 0.0, 0.0);
        let b = pose(0.0, 0.0, 0.0, 1.0);
        let mid = SE3::interpolate(&a, &b, 0.5);
        assert_relative_eq!(mid.rotation.angle(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn finite_difference_is_rate_per_time_unit() {
        let a = pose(0.0, 0.0, 0.0, 0.0);
        let b = pose(2.0, 4.0, 0.0, 0.5);
        let twist = SE3::finite_difference(&a, &b, 2.0);
        assert_relative_eq!(linear_part(&twist), Vector3::new(1.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(angular_part(&twist), Vector3::new(0.0, 0.0, 0.25), epsilon = 1e-12);
    }

    #[test]
    fn row_round_trip_is_exact() {
        let poses = [
            Isometry3::new(Vector3::new(0.2, 0.1, -3.0), Vector3::new(0.4, -1.1, 0.7)),
            Isometry3::new(Vector3::new(-7.25, 1e-9, 3.0e5), Vector3::new(-2.9, 0.3, 0.01)),
            pose(1.0 / 3.0, 2.0 / 7.0, 0.0, 1e-7)
        ];
        for t in poses.iter() {
            let back = SE3::from_row(&t.to_row()).unwrap();
            assert_eq!(back.to_row(), t.to_row());
            assert_eq!(&back, t);
        }
    }

    #[test]
    fn row_normalizes_or_rejects_quaternion() {
        let scaled = SE3::from_row(&[1.0, 2.0, 3.0, 2.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(scaled.rotation, UnitQuaternion::identity());
        assert_eq!(scaled.translation.vector, Vector3::new(1.0, 2.0, 3.0));

        assert!(SE3::from_row(&[1.0, 2.0]).is_err());
        assert!(SE3::from_row(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).is_err());
        assert!(SE3::from_row(&[0.0, 0.0, 0.0, f64::NAN, 0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn small_rotations_keep_screw_motion_accurate() {
        for theta in [1.02e-8, 3e-8, 1e-7, 1e-6, 1e-5, 1e-4, 1e-3, 2e-3] {
            let t = pose(1.0, 0.0, 0.0, theta);

            let xi = log(&t);
            assert!(xi.iter().all(|v| v.is_finite()), "log not finite at {}", theta);
            // rho = J⁻¹(ω)·t，t ⟂ ω 時 x 分量為 1 - c·θ²
            assert_relative_eq!(xi[0], 1.0 - theta * theta / 12.0, epsilon = 1e-12);
            assert_relative_eq!(xi[1], -0.5 * theta, max_relative = 1e-9);
            assert_relative_eq!(xi[5], theta, max_relative = 1e-9);

            let back = exp(&xi);
            assert_relative_eq!(back.translation.vector, t.translation.vector, epsilon = 1e-12);
            assert_relative_eq!(log_rotation(&back.rotation.rotation_to(&t.rotation)).norm(), 0.0, epsilon = 1e-14);

            let mid = SE3::interpolate(&SE3::identity(), &t, 0.5);
            assert_relative_eq!(mid.translation.vector.x, 0.5, epsilon = 1e-9);
            assert_relative_eq!(log_rotation(&mid.rotation)[2], 0.5 * theta, max_relative = 1e-9);
        }
    }

    #[test]
    fn rotation_log_matches_angle_away_from_zero() {
        for theta in [0.1, 1.0, 3.0] {
            let rotation = UnitQuaternion::from_scaled_axis(Vector3::new(0.0, theta, 0.0));
            assert_relative_eq!(log_rotation(&rotation), Vector3::new(0.0, theta, 0.0), epsilon = 1e-12);
        }
    }
}
