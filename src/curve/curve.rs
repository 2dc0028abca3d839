use std::collections::BTreeMap;
use std::path::Path;

use log::{
    debug,
    warn
};

use crate::backend::expression::{
    DerivativeExpression,
    ValueExpression
};
use crate::backend::factorgraph::{
    FactorGraph,
    PriorFactor
};
use crate::backend::values::{
    KeySet,
    Values
};
use crate::curve::coefficient::coefficient::Coefficient;
use crate::curve::coefficient::coefficientmanager::CoefficientManager;
use crate::curve::coefficient::key::Key;
use crate::curve::curveerror::CurveError;
use crate::curve::evaluator::{
    interpolation_weight,
    time_span
};
use crate::io::curveio;

/// Signed integer time stamp; the unit is chosen by the caller (usually ns).
pub type Time = i64;

pub trait Curve {
    type ValueType: Coefficient;

    /// The first valid time of the curve, `None` when the curve is empty.
    fn min_time(&self) -> Option<Time>;

    /// The last valid time of the curve, `None` when the curve is empty.
    fn max_time(&self) -> Option<Time>;

    fn evaluate(&self, time: Time) -> Result<Self::ValueType, CurveError>;

    /// First derivative is the slope between the two supporting coefficients
    /// (see `CoefficientManager::coefficients_at` for the boundary rules);
    /// derivatives of order > 1 are zero.
    fn evaluate_derivative(
        &self,
        time: Time,
        derivative_order: u32
    ) -> Result<<Self::ValueType as Coefficient>::Derivative, CurveError>;

    /// Extend the curve so that it can be evaluated at these times, letting
    /// the curve's extend policy decide how samples become coefficients.
    fn extend(&mut self, times: &[Time], values: &[Self::ValueType]) -> Result<Vec<Key>, CurveError>;

    /// Fit a new curve to these samples. The existing curve is replaced.
    fn fit_curve(&mut self, times: &[Time], values: &[Self::ValueType]) -> Result<Vec<Key>, CurveError>;

    fn set_time_range(&mut self, min_time: Time, max_time: Time) -> Result<(), CurveError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// CoefficientCurve：所有以 CoefficientManager 為底的曲線共用的操作
// ─────────────────────────────────────────────────────────────────────────────

pub trait CoefficientCurve: Curve {
    fn manager(&self) -> &CoefficientManager<Self::ValueType>;

    fn manager_mut(&mut self) -> &mut CoefficientManager<Self::ValueType>;

    fn size(&self) -> usize {
        self.manager().len()
    }

    fn is_empty(&self) -> bool {
        self.manager().is_empty()
    }

    fn clear(&mut self) {
        debug!("clearing curve of {} coefficients", self.size());
        self.manager_mut().clear();
    }

    /// The (one or two) coefficients active at `time`, by key.
    fn coefficients_at(&self, time: Time) -> Result<BTreeMap<Key, Self::ValueType>, CurveError> {
        let (first, second) = self.manager().coefficients_at(time)?;
        let mut coefficients = BTreeMap::new();
        coefficients.insert(first.key(), first.coefficient().clone());
        coefficients.insert(second.key(), second.coefficient().clone());
        Ok(coefficients)
    }

    fn coefficients_in_range(&self, start_time: Time, end_time: Time) -> BTreeMap<Key, Self::ValueType> {
        self.manager().coefficients_in_range(start_time, end_time)
    }

    fn coefficients(&self) -> BTreeMap<Key, Self::ValueType> {
        self.manager().coefficients()
    }

    fn set_coefficient(&mut self, key: Key, value: Self::ValueType) -> Result<(), CurveError> {
        self.manager_mut().set_coefficient_by_key(key, value)
    }

    fn set_coefficients(&mut self, coefficients: &BTreeMap<Key, Self::ValueType>) -> Result<(), CurveError> {
        self.manager_mut().set_coefficients(coefficients)
    }

    /// Set some coefficients of the curve without clearing it. Values at
    /// times already present are overwritten and keep their keys.
    fn set_curve(&mut self, times: &[Time], values: &[Self::ValueType]) -> Result<Vec<Key>, CurveError> {
        self.manager_mut().insert_or_update_coefficients(times, values)
    }

    fn time_at_key(&self, key: Key) -> Result<Time, CurveError> {
        self.manager().time_at_key(key)
    }

    /// Writes the current value of every requested key into `values`.
    /// Keys the curve does not hold are skipped.
    fn initialize_values(&self, keys: &KeySet, values: &mut Values<Self::ValueType>) {
        for &key in keys.iter() {
            match self.manager().coefficient_by_key(key) {
                Ok(coefficient) => {
                    values.insert(key, coefficient.clone());
                },
                Err(_) => warn!("key {} requested by the back-end is not part of the curve", key)
            }
        }
    }

    fn initialize_all_values(&self, values: &mut Values<Self::ValueType>) {
        for entry in self.manager().iter() {
            values.insert(entry.key(), entry.coefficient().clone());
        }
    }

    /// Pulls optimized values back into the curve. Keys missing from
    /// `values` keep their current coefficient.
    fn update_from_values(&mut self, values: &Values<Self::ValueType>) {
        let manager = self.manager_mut();
        for key in manager.keys() {
            if let Some(value) = values.at(key) {
                // key 來自 manager 本身，不會失敗
                let _ = manager.set_coefficient_by_key(key, value.clone());
            }
        }
    }

    /// Adds a prior on every coefficient active at `prior_time`, anchored at
    /// its current value.
    fn add_prior_factors(&self, graph: &mut FactorGraph<Self::ValueType>, prior_time: Time) -> Result<(), CurveError> {
        let (first, second) = self.manager().coefficients_at(prior_time)?;
        graph.push(PriorFactor::new(first.key(), first.coefficient().clone()));
        if second.key() != first.key() {
            graph.push(PriorFactor::new(second.key(), second.coefficient().clone()));
        }
        Ok(())
    }

    fn value_expression(&self, time: Time) -> Result<ValueExpression<Self::ValueType>, CurveError> {
        let (first, second) = self.manager().coefficients_at(time)?;
        let alpha = interpolation_weight(first.time(), second.time(), time);
        Ok(ValueExpression::new(first.key(), second.key(), alpha))
    }

    fn derivative_expression(
        &self,
        time: Time,
        derivative_order: u32
    ) -> Result<DerivativeExpression<Self::ValueType>, CurveError> {
        if derivative_order == 0 {
            return Err(CurveError::PreconditionViolation("derivative order must be at least 1".to_owned()));
        }
        if self.size() < 2 {
            return Err(CurveError::not_enough_coefficients(2, self.size()));
        }
        let (first, second) = self.manager().coefficients_at(time)?;
        let dt = time_span(first.time(), second.time());
        Ok(DerivativeExpression::new(first.key(), second.key(), dt, derivative_order))
    }

    fn save_curve_times_and_values<P: AsRef<Path>>(&self, file_path: P) -> Result<(), CurveError> {
        curveio::save_curve_times_and_values(self.manager(), file_path)
    }
}
