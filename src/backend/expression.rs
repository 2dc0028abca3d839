use std::marker::PhantomData;

use crate::backend::values::{
    KeySet,
    Values
};
use crate::curve::coefficient::coefficient::Coefficient;
use crate::curve::coefficient::key::Key;
use crate::curve::curveerror::CurveError;

// ─────────────────────────────────────────────────────────────────────────────
// 兩個 key 上的符號運算式
// ─────────────────────────────────────────────────────────────────────────────
//
// 曲線只負責指出哪兩個係數參與、權重為何；實際數值在後端的 `Values` 上求得，
// 因此最佳化後更新的值會直接反映在結果中。

fn lookup<V>(values: &Values<V>, key: Key) -> Result<&V, CurveError> {
    values.at(key).ok_or_else(|| CurveError::key_not_found(key))
}

/// `interpolate(values[first_key], values[second_key], alpha)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueExpression<V> {
    first_key: Key,
    second_key: Key,
    alpha: f64,
    marker: PhantomData<V>
}

impl<V: Coefficient> ValueExpression<V> {
    pub fn new(first_key: Key, second_key: Key, alpha: f64) -> ValueExpression<V> {
        ValueExpression { first_key, second_key, alpha, marker: PhantomData }
    }

    pub fn keys(&self) -> KeySet {
        [self.first_key, self.second_key].into_iter().collect()
    }

    /// Weight of the first key.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// `(key, weight)` pairs; exact for vector-space coefficients.
    pub fn weights(&self) -> [(Key, f64); 2] {
        [(self.first_key, self.alpha), (self.second_key, 1.0 - self.alpha)]
    }

    pub fn evaluate(&self, values: &Values<V>) -> Result<V, CurveError> {
        let first = lookup(values, self.first_key)?;
        if self.alpha == 1.0 {
            return Ok(first.clone());
        }
        let second = lookup(values, self.second_key)?;
        if self.alpha == 0.0 {
            return Ok(second.clone());
        }
        Ok(V::interpolate(first, second, self.alpha))
    }
}

/// Finite-difference derivative between two keys `dt` time units apart.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivativeExpression<V> {
    first_key: Key,
    second_key: Key,
    dt: f64,
    derivative_order: u32,
    marker: PhantomData<V>
}

impl<V: Coefficient> DerivativeExpression<V> {
    pub fn new(first_key: Key, second_key: Key, dt: f64, derivative_order: u32) -> DerivativeExpression<V> {
        DerivativeExpression { first_key, second_key, dt, derivative_order, marker: PhantomData }
    }

    pub fn keys(&self) -> KeySet {
        [self.first_key, self.second_key].into_iter().collect()
    }

    pub fn derivative_order(&self) -> u32 {
        self.derivative_order
    }

    pub fn weights(&self) -> [(Key, f64); 2] {
        if self.derivative_order > 1 {
            [(self.first_key, 0.0), (self.second_key, 0.0)]
        } else {
            [(self.first_key, -1.0 / self.dt), (self.second_key, 1.0 / self.dt)]
        }
    }

    pub fn evaluate(&self, values: &Values<V>) -> Result<V::Derivative, CurveError> {
        let first = lookup(values, self.first_key)?;
        let second = lookup(values, self.second_key)?;
        if self.derivative_order > 1 {
            Ok(first.zero_derivative())
        } else {
            Ok(V::finite_difference(first, second, self.dt))
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    use super::*;

    fn scalar(v: f64) -> DVector<f64> {
        DVector::from_element(1, v)
    }

    #[test]
    fn value_expression_reads_current_values() {
        let mut values = Values::new();
        values.insert(1, scalar(0.0));
        values.insert(2, scalar(10.0));
        let expression: ValueExpression<DVector<f64>> = ValueExpression::new(1, 2, 0.25);
        assert_relative_eq!(expression.evaluate(&values).unwrap()[0], 7.5, epsilon = 1e-12);

        values.insert(2, scalar(20.0));
        assert_relative_eq!(expression.evaluate(&values).unwrap()[0], 15.0, epsilon = 1e-12);
        assert_eq!(expression.weights(), [(1, 0.25), (2, 0.75)]);
    }

    #[test]
    fn missing_key_fails() {
        let values: Values<DVector<f64>> = Values::new();
        let expression: ValueExpression<DVector<f64>> = ValueExpression::new(1, 2, 0.5);
        assert!(matches!(expression.evaluate(&values), Err(CurveError::NotFound(_))));
    }

    #[test]
    fn derivative_expression_weights() {
        let mut values = Values::new();
        values.insert(4, scalar(1.0));
        values.insert(5, scalar(5.0));
        let expression: DerivativeExpression<DVector<f64>> = DerivativeExpression::new(4, 5, 2.0, 1);
        assert_relative_eq!(expression.evaluate(&values).unwrap()[0], 2.0);
        assert_eq!(expression.weights(), [(4, -0.5), (5, 0.5)]);

        let second: DerivativeExpression<DVector<f64>> = DerivativeExpression::new(4, 5, 2.0, 2);
        assert_eq!(second.evaluate(&values).unwrap()[0], 0.0);
        assert_eq!(second.keys().len(), 2);
    }
}
