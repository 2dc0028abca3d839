use std::fmt;

use log::debug;
use nalgebra::Vector3;

use crate::curve::coefficient::coefficient::Coefficient;
use crate::curve::coefficient::coefficientmanager::CoefficientManager;
use crate::curve::coefficient::key::Key;
use crate::curve::curve::{
    CoefficientCurve,
    Curve,
    Time
};
use crate::curve::curveerror::CurveError;
use crate::curve::evaluator;
use crate::curve::policy::extendpolicy::ExtendPolicy;
use crate::curve::policy::samplingpolicy::SamplingPolicy;
use crate::math::se3::{
    angular_part,
    linear_part,
    rotate_twist,
    Twist,
    SE3
};

/// Discrete SE(3) curve: poses at sparse times, screw-motion interpolation
/// in between.
///
/// 座標系慣例：係數為 T_A_B（frame B 在 frame A 中的位姿）。
/// - `*_a` 系列：frame B 相對 frame A 的運動，以 frame A 表示；
/// - `*_b` 系列：同一運動以 frame B 表示，即以該時刻位姿旋轉的反向作用於 `*_a`。
pub struct DiscreteSE3Curve<P = SamplingPolicy> {
    manager: CoefficientManager<SE3>,
    policy: P
}

impl DiscreteSE3Curve<SamplingPolicy> {
    pub fn new() -> DiscreteSE3Curve<SamplingPolicy> {
        DiscreteSE3Curve::with_policy(SamplingPolicy::new())
    }

    /// eg. 4 adds one coefficient every 4 extend calls.
    pub fn set_sampling_ratio(&mut self, ratio: u32) -> Result<(), CurveError> {
        self.policy.set_minimum_measurements(ratio)
    }

    pub fn set_min_sampling_period(&mut self, period: Time) -> Result<(), CurveError> {
        self.policy.set_min_sampling_period(period)
    }
}

impl Default for DiscreteSE3Curve<SamplingPolicy> {
    fn default() -> Self {
        DiscreteSE3Curve::new()
    }
}

impl<P> DiscreteSE3Curve<P>
    where P: ExtendPolicy<SE3> {
    pub fn with_policy(policy: P) -> DiscreteSE3Curve<P> {
        DiscreteSE3Curve {
            manager: CoefficientManager::new(),
            policy
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Left-multiplies every coefficient by `transform`, moving the whole
    /// trajectory into another reference frame. Keys and times are kept.
    pub fn transform_curve(&mut self, transform: &SE3) {
        debug!("transforming {} coefficients", self.manager.len());
        self.manager.transform_coefficients(|pose| transform * pose);
    }

    // ── Frame A ──────────────────────────────────────────────────────────────

    pub fn evaluate_derivative_a(&self, derivative_order: u32, time: Time) -> Result<Twist, CurveError> {
        self.evaluate_derivative(time, derivative_order)
    }

    pub fn evaluate_twist_a(&self, time: Time) -> Result<Twist, CurveError> {
        self.evaluate_derivative_a(1, time)
    }

    pub fn evaluate_linear_velocity_a(&self, time: Time) -> Result<Vector3<f64>, CurveError> {
        Ok(linear_part(&self.evaluate_twist_a(time)?))
    }

    pub fn evaluate_angular_velocity_a(&self, time: Time) -> Result<Vector3<f64>, CurveError> {
        Ok(angular_part(&self.evaluate_twist_a(time)?))
    }

    pub fn evaluate_linear_derivative_a(&self, derivative_order: u32, time: Time) -> Result<Vector3<f64>, CurveError> {
        Ok(linear_part(&self.evaluate_derivative_a(derivative_order, time)?))
    }

    pub fn evaluate_angular_derivative_a(&self, derivative_order: u32, time: Time) -> Result<Vector3<f64>, CurveError> {
        Ok(angular_part(&self.evaluate_derivative_a(derivative_order, time)?))
    }

    // ── Frame B ──────────────────────────────────────────────────────────────

    pub fn evaluate_derivative_b(&self, derivative_order: u32, time: Time) -> Result<Twist, CurveError> {
        let derivative_a = self.evaluate_derivative_a(derivative_order, time)?;
        let pose = self.evaluate(time)?;
        Ok(rotate_twist(&pose.rotation.inverse(), &derivative_a))
    }

    pub fn evaluate_twist_b(&self, time: Time) -> Result<Twist, CurveError> {
        self.evaluate_derivative_b(1, time)
    }

    pub fn evaluate_linear_velocity_b(&self, time: Time) -> Result<Vector3<f64>, CurveError> {
        Ok(linear_part(&self.evaluate_twist_b(time)?))
    }

    pub fn evaluate_angular_velocity_b(&self, time: Time) -> Result<Vector3<f64>, CurveError> {
        Ok(angular_part(&self.evaluate_twist_b(time)?))
    }

    pub fn evaluate_linear_derivative_b(&self, derivative_order: u32, time: Time) -> Result<Vector3<f64>, CurveError> {
        Ok(linear_part(&self.evaluate_derivative_b(derivative_order, time)?))
    }

    pub fn evaluate_angular_derivative_b(&self, derivative_order: u32, time: Time) -> Result<Vector3<f64>, CurveError> {
        Ok(angular_part(&self.evaluate_derivative_b(derivative_order, time)?))
    }
}

impl<P> Curve for DiscreteSE3Curve<P>
    where P: ExtendPolicy<SE3> {
    type ValueType = SE3;

    fn min_time(&self) -> Option<Time> {
        self.manager.front_time()
    }

    fn max_time(&self) -> Option<Time> {
        self.manager.back_time()
    }

    fn evaluate(&self, time: Time) -> Result<SE3, CurveError> {
        evaluator::evaluate(&self.manager, time)
    }

    /// Linear velocity in rows 0..3, angular velocity in rows 3..6, both in
    /// frame A.
    fn evaluate_derivative(&self, time: Time, derivative_order: u32) -> Result<Twist, CurveError> {
        evaluator::evaluate_derivative(&self.manager, time, derivative_order)
    }

    fn extend(&mut self, times: &[Time], values: &[SE3]) -> Result<Vec<Key>, CurveError> {
        self.policy.extend(times, values, &mut self.manager)
    }

    fn fit_curve(&mut self, times: &[Time], values: &[SE3]) -> Result<Vec<Key>, CurveError> {
        if times.len() != values.len() {
            return Err(CurveError::length_mismatch(times.len(), values.len()));
        }
        if times.is_empty() {
            return Ok(Vec::new());
        }
        let mut manager = CoefficientManager::new();
        let keys = manager.insert_coefficients(times, values)?;
        debug!("fitted pose curve with {} coefficients", keys.len());
        self.manager = manager;
        self.policy.reset();
        Ok(keys)
    }

    fn set_time_range(&mut self, _min_time: Time, _max_time: Time) -> Result<(), CurveError> {
        Err(CurveError::Unimplemented("set_time_range on a discrete SE3 curve"))
    }
}

impl<P> CoefficientCurve for DiscreteSE3Curve<P>
    where P: ExtendPolicy<SE3> {
    fn manager(&self) -> &CoefficientManager<SE3> {
        &self.manager
    }

    fn manager_mut(&mut self) -> &mut CoefficientManager<SE3> {
        &mut self.manager
    }

    fn clear(&mut self) {
        debug!("clearing pose curve of {} coefficients", self.manager.len());
        self.manager.clear();
        self.policy.reset();
    }
}

impl<P> fmt::Display for DiscreteSE3Curve<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=========================================")?;
        writeln!(f, "size : {}", self.manager.len())?;
        if let (Some(min_time), Some(max_time)) = (self.manager.front_time(), self.manager.back_time()) {
            writeln!(f, "curve defined between times: {} and {}", min_time, max_time)?;
        }
        writeln!(f, "=========================================")?;
        for entry in self.manager.iter() {
            let row: Vec<String> = entry.coefficient().to_row().iter().map(|v| v.to_string()).collect();
            writeln!(f, "coefficient {}: [{}] | time: {}", entry.key(), row.join(", "), entry.time())?;
        }
        write!(f, "=========================================")
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;
    use nalgebra::Isometry3;

    use super::*;
    use crate::backend::factorgraph::FactorGraph;
    use crate::backend::values::Values;

    fn pose(x: f64, y: f64, yaw: f64) -> SE3 {
        Isometry3::new(Vector3::new(x, y, 0.0), Vector3::z() * yaw)
    }

    fn straight_curve() -> DiscreteSE3Curve {
        let mut curve = DiscreteSE3Curve::new();
        curve
            .fit_curve(&[0, 10, 20], &[pose(0.0, 0.0, 0.0), pose(10.0, 0.0, 0.0), pose(10.0, 10.0, FRAC_PI_2)])
            .unwrap();
        curve
    }

    #[test]
    fn evaluates_on_and_between_coefficients() {
        let curve = straight_curve();
        let on = curve.evaluate(10).unwrap();
        assert_eq!(on, pose(10.0, 0.0, 0.0));
        let between = curve.evaluate(5).unwrap();
        assert_relative_eq!(between.translation.vector, Vector3::new(5.0, 0.0, 0.0), epsilon = 1e-12);
        assert!(curve.evaluate(-1).is_err());
        assert!(curve.evaluate(21).is_err());
    }

    #[test]
    fn twist_in_both_frames() {
        let curve = straight_curve();
        // last segment: +10 in y and a quarter turn over 10 time units
        let linear_a = curve.evaluate_linear_velocity_a(20).unwrap();
        let angular_a = curve.evaluate_angular_velocity_a(20).unwrap();
        assert_relative_eq!(linear_a, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(angular_a, Vector3::new(0.0, 0.0, FRAC_PI_2 / 10.0), epsilon = 1e-12);

        // at t = 20 the body is yawed by 90°: world +y is body +x
        let linear_b = curve.evaluate_linear_velocity_b(20).unwrap();
        assert_relative_eq!(linear_b, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        let angular_b = curve.evaluate_angular_velocity_b(20).unwrap();
        assert_relative_eq!(angular_b, angular_a, epsilon = 1e-12);

        let twist_a = curve.evaluate_twist_a(20).unwrap();
        assert_relative_eq!(linear_part(&twist_a), linear_a);
        let twist_b = curve.evaluate_twist_b(20).unwrap();
        assert_relative_eq!(linear_part(&twist_b), linear_b);
    }

    #[test]
    fn higher_order_derivatives_vanish() {
        let curve = straight_curve();
        assert_eq!(curve.evaluate_derivative_a(2, 5).unwrap(), Twist::zeros());
        assert_eq!(curve.evaluate_derivative_b(3, 15).unwrap(), Twist::zeros());
        assert_eq!(curve.evaluate_linear_derivative_a(2, 5).unwrap(), Vector3::zeros());
        assert_eq!(curve.evaluate_angular_derivative_b(2, 5).unwrap(), Vector3::zeros());
        assert_relative_eq!(
            curve.evaluate_linear_derivative_b(1, 5).unwrap(),
            Vector3::new(1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(curve.evaluate_angular_derivative_a(1, 5).unwrap(), Vector3::zeros());
    }

    #[test]
    fn decimating_stream() {
        let mut curve = DiscreteSE3Curve::new();
        curve.set_sampling_ratio(3).unwrap();
        for t in 0..8 {
            curve.extend(&[t], &[pose(t as f64, 0.0, 0.0)]).unwrap();
        }
        // 0, 1 bootstrap; 2 appended then slid to 4; 5 appended then slid to 7
        assert_eq!(curve.manager().times(), vec![0, 1, 4, 7]);
        assert_eq!(curve.evaluate(7).unwrap(), pose(7.0, 0.0, 0.0));
    }

    #[test]
    fn min_sampling_period_drops_dense_samples() {
        let mut curve = DiscreteSE3Curve::new();
        curve.set_min_sampling_period(3).unwrap();
        for t in 0..10 {
            curve.extend(&[t], &[pose(t as f64, 0.0, 0.0)]).unwrap();
        }
        assert_eq!(curve.manager().times(), vec![0, 1, 4, 7]);
        assert!(curve.set_min_sampling_period(-1).is_err());
    }

    #[test]
    fn transform_keeps_keys_and_times() {
        let mut curve = straight_curve();
        let keys = curve.manager().keys();
        let times = curve.manager().times();
        let shift = pose(1.0, 2.0, FRAC_PI_2);
        let before = curve.coefficients();

        curve.transform_curve(&shift);

        assert_eq!(curve.manager().keys(), keys);
        assert_eq!(curve.manager().times(), times);
        for (key, value) in curve.coefficients().iter() {
            let expected = shift * before[key];
            assert_relative_eq!(value.translation.vector, expected.translation.vector, epsilon = 1e-12);
            assert_relative_eq!(value.rotation.angle_to(&expected.rotation), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn prior_factors_reference_active_keys() {
        let curve = straight_curve();
        let keys = curve.manager().keys();
        let mut graph = FactorGraph::new();
        curve.add_prior_factors(&mut graph, 15).unwrap();
        assert_eq!(graph.keys(), vec![keys[1], keys[2]]);
        assert_eq!(*graph.factors()[0].prior(), pose(10.0, 0.0, 0.0));
        assert!(curve.add_prior_factors(&mut graph, 99).is_err());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn expressions_track_back_end_values() {
        let curve = straight_curve();
        let keys = curve.manager().keys();
        let expression = curve.value_expression(5).unwrap();
        assert_eq!(expression.keys().into_iter().collect::<Vec<_>>(), vec![keys[0], keys[1]]);
        assert_relative_eq!(expression.alpha(), 0.5);

        let mut values = Values::new();
        curve.initialize_all_values(&mut values);
        values.insert(keys[1], pose(20.0, 0.0, 0.0));
        let moved = expression.evaluate(&values).unwrap();
        assert_relative_eq!(moved.translation.vector, Vector3::new(10.0, 0.0, 0.0), epsilon = 1e-12);

        let derivative = curve.derivative_expression(5, 1).unwrap();
        assert_relative_eq!(
            linear_part(&derivative.evaluate(&values).unwrap()),
            Vector3::new(2.0, 0.0, 0.0),
            epsilon = 1e-12
        );
        assert!(curve.derivative_expression(5, 0).is_err());
    }

    #[test]
    fn clear_resets_the_curve() {
        let mut curve = straight_curve();
        curve.clear();
        assert!(curve.is_empty());
        assert_eq!(curve.min_time(), None);
        assert!(matches!(curve.evaluate(0), Err(CurveError::NotFound(_))));
        assert!(matches!(curve.set_time_range(0, 1), Err(CurveError::Unimplemented(_))));
    }
}
