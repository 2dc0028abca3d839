use std::collections::BTreeMap;
use std::fmt;

use log::{
    debug,
    warn
};
use nalgebra::DVector;

use crate::backend::values::Values;
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

/// Piecewise-linear curve in R^n.
pub struct LinearInterpolationVectorSpaceCurve<P = SamplingPolicy> {
    dimension: usize,
    manager: CoefficientManager<DVector<f64>>,
    policy: P
}

impl LinearInterpolationVectorSpaceCurve<SamplingPolicy> {
    pub fn new(dimension: usize) -> LinearInterpolationVectorSpaceCurve<SamplingPolicy> {
        LinearInterpolationVectorSpaceCurve::with_policy(dimension, SamplingPolicy::new())
    }
}

impl<P> LinearInterpolationVectorSpaceCurve<P>
    where P: ExtendPolicy<DVector<f64>> {
    pub fn with_policy(dimension: usize, policy: P) -> LinearInterpolationVectorSpaceCurve<P> {
        LinearInterpolationVectorSpaceCurve {
            dimension,
            manager: CoefficientManager::new(),
            policy
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    fn check_dimensions(&self, values: &[DVector<f64>]) -> Result<(), CurveError> {
        match values.iter().find(|v| v.len() != self.dimension) {
            Some(v) => Err(CurveError::PreconditionViolation(format!(
                "the vectors must be of length {}, got {}",
                self.dimension,
                v.len()
            ))),
            None => Ok(())
        }
    }
}

impl<P> Curve for LinearInterpolationVectorSpaceCurve<P>
    where P: ExtendPolicy<DVector<f64>> {
    type ValueType = DVector<f64>;

    fn min_time(&self) -> Option<Time> {
        self.manager.front_time()
    }

    fn max_time(&self) -> Option<Time> {
        self.manager.back_time()
    }

    fn evaluate(&self, time: Time) -> Result<DVector<f64>, CurveError> {
        evaluator::evaluate(&self.manager, time)
    }

    fn evaluate_derivative(&self, time: Time, derivative_order: u32) -> Result<DVector<f64>, CurveError> {
        evaluator::evaluate_derivative(&self.manager, time, derivative_order)
    }

    fn extend(&mut self, times: &[Time], values: &[DVector<f64>]) -> Result<Vec<Key>, CurveError> {
        self.check_dimensions(values)?;
        self.policy.extend(times, values, &mut self.manager)
    }

    fn fit_curve(&mut self, times: &[Time], values: &[DVector<f64>]) -> Result<Vec<Key>, CurveError> {
        if times.len() != values.len() {
            return Err(CurveError::length_mismatch(times.len(), values.len()));
        }
        if times.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimensions(values)?;
        let mut manager = CoefficientManager::new();
        let keys = manager.insert_coefficients(times, values)?;
        debug!("fitted vector curve with {} coefficients", keys.len());
        self.manager = manager;
        self.policy.reset();
        Ok(keys)
    }

    fn set_time_range(&mut self, _min_time: Time, _max_time: Time) -> Result<(), CurveError> {
        Err(CurveError::Unimplemented("set_time_range on a linear vector space curve"))
    }
}

impl<P> CoefficientCurve for LinearInterpolationVectorSpaceCurve<P>
    where P: ExtendPolicy<DVector<f64>> {
    fn manager(&self) -> &CoefficientManager<DVector<f64>> {
        &self.manager
    }

    fn manager_mut(&mut self) -> &mut CoefficientManager<DVector<f64>> {
        &mut self.manager
    }

    fn clear(&mut self) {
        debug!("clearing vector curve of {} coefficients", self.manager.len());
        self.manager.clear();
        self.policy.reset();
    }

    fn set_curve(&mut self, times: &[Time], values: &[DVector<f64>]) -> Result<Vec<Key>, CurveError> {
        self.check_dimensions(values)?;
        self.manager.insert_or_update_coefficients(times, values)
    }

    fn set_coefficient(&mut self, key: Key, value: DVector<f64>) -> Result<(), CurveError> {
        self.check_dimensions(std::slice::from_ref(&value))?;
        self.manager.set_coefficient_by_key(key, value)
    }

    fn set_coefficients(&mut self, coefficients: &BTreeMap<Key, DVector<f64>>) -> Result<(), CurveError> {
        let values: Vec<DVector<f64>> = coefficients.values().cloned().collect();
        self.check_dimensions(&values)?;
        self.manager.set_coefficients(coefficients)
    }

    /// Values of the wrong dimension are skipped; their coefficient is kept.
    fn update_from_values(&mut self, values: &Values<DVector<f64>>) {
        for key in self.manager.keys() {
            let Some(value) = values.at(key) else {
                continue;
            };
            if value.len() != self.dimension {
                warn!(
                    "skipping value of key {}: expected dimension {}, got {}",
                    key, self.dimension, value.len()
                );
                continue;
            }
            // key 來自 manager 本身，不會失敗
            let _ = self.manager.set_coefficient_by_key(key, value.clone());
        }
    }
}

impl<P> fmt::Display for LinearInterpolationVectorSpaceCurve<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=========================================")?;
        writeln!(f, "size : {}", self.manager.len())?;
        writeln!(f, "dimension : {}", self.dimension)?;
        if let (Some(min_time), Some(max_time)) = (self.manager.front_time(), self.manager.back_time()) {
            writeln!(f, "curve defined between times: {} and {}", min_time, max_time)?;
        }
        writeln!(f, "=========================================")?;
        for entry in self.manager.iter() {
            let values: Vec<String> = entry.coefficient().iter().map(|v| v.to_string()).collect();
            writeln!(f, "coefficient {}: [{}] | time: {}", entry.key(), values.join(", "), entry.time())?;
        }
        write!(f, "=========================================")
    }
}
