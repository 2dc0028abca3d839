use std::fmt::Debug;

use nalgebra::DVector;

use crate::curve::curveerror::CurveError;

/// 曲線係數必須提供的群運算。
///
/// 對向量空間曲線而言就是線性組合；對位姿曲線則是 SE(3) 上的測地線插值
/// （見 `math::se3`）。
pub trait Coefficient: Clone + Debug {
    type Derivative: Clone + Debug;

    /// Blend two coefficients. `alpha` is the weight of `first`: `alpha == 1`
    /// gives `first`, `alpha == 0` gives `second`.
    fn interpolate(first: &Self, second: &Self, alpha: f64) -> Self;

    /// Slope from `first` to `second` over `dt` time units.
    fn finite_difference(first: &Self, second: &Self, dt: f64) -> Self::Derivative;

    /// Derivative of order > 1 for a piecewise-linear representation.
    fn zero_derivative(&self) -> Self::Derivative;

    /// Flat numeric form used by the text table writer.
    fn to_row(&self) -> Vec<f64>;

    fn from_row(row: &[f64]) -> Result<Self, CurveError>;
}

impl Coefficient for DVector<f64> {
    type Derivative = DVector<f64>;

    fn interpolate(first: &Self, second: &Self, alpha: f64) -> Self {
        first * alpha + second * (1.0 - alpha)
    }

    fn finite_difference(first: &Self, second: &Self, dt: f64) -> Self::Derivative {
        (second - first) / dt
    }

    fn zero_derivative(&self) -> Self::Derivative {
        DVector::zeros(self.len())
    }

    fn to_row(&self) -> Vec<f64> {
        self.iter().copied().collect()
    }

    fn from_row(row: &[f64]) -> Result<Self, CurveError> {
        if row.is_empty() {
            return Err(CurveError::PreconditionViolation("a vector needs at least one value".to_owned()));
        }
        Ok(DVector::from_row_slice(row))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn vector_interpolation_weights_first_by_alpha() {
        let a = DVector::from_vec(vec![0.0, 2.0]);
        let b = DVector::from_vec(vec![10.0, 4.0]);
        let mid = DVector::interpolate(&a, &b, 0.25);
        assert_relative_eq!(mid[0], 7.5);
        assert_relative_eq!(mid[1], 3.5);
        assert_eq!(DVector::interpolate(&a, &b, 1.0), a);
        assert_eq!(DVector::interpolate(&a, &b, 0.0), b);
    }

    #[test]
    fn vector_finite_difference() {
        let a = DVector::from_vec(vec![10.0]);
        let b = DVector::from_vec(vec![40.0]);
        let slope = DVector::finite_difference(&a, &b, 5.0);
        assert_relative_eq!(slope[0], 6.0);
        assert_eq!(a.zero_derivative(), DVector::zeros(1));
    }

    #[test]
    fn vector_row_needs_values() {
        let row = DVector::from_vec(vec![1.5, -2.0]).to_row();
        assert_eq!(<DVector<f64> as Coefficient>::from_row(&row).unwrap(), DVector::from_vec(vec![1.5, -2.0]));
        assert!(matches!(
            <DVector<f64> as Coefficient>::from_row(&[]),
            Err(CurveError::PreconditionViolation(_))
        ));
    }
}
