use crate::curve::coefficient::coefficient::Coefficient;
use crate::curve::coefficient::coefficientmanager::CoefficientManager;
use crate::curve::curve::Time;
use crate::curve::curveerror::CurveError;

// ─────────────────────────────────────────────────────────────────────────────
// Local-support evaluation
// ─────────────────────────────────────────────────────────────────────────────
//
// 只有包夾查詢時間的兩個係數會影響結果：
//
//   alpha = (t1 - t) / (t1 - t0)
//   v(t)  = alpha·v0 + (1 - alpha)·v1
//
// 位姿曲線的 `Coefficient::interpolate` 在 SE(3) 上以同一個 alpha 做測地線插值。

/// `to - from` as `f64`; exact span even when the `Time` difference overflows.
pub fn time_span(from: Time, to: Time) -> f64 {
    (to as i128 - from as i128) as f64
}

/// Weight of the first coefficient of a supporting pair. A degenerate pair
/// (single-coefficient curve) gives all the weight to the first entry.
pub fn interpolation_weight(first_time: Time, second_time: Time, time: Time) -> f64 {
    if second_time == first_time {
        1.0
    } else {
        time_span(time, second_time) / time_span(first_time, second_time)
    }
}

pub fn evaluate<V>(manager: &CoefficientManager<V>, time: Time) -> Result<V, CurveError>
    where V: Coefficient {
    let (first, second) = manager.coefficients_at(time)?;
    if first.time() == time {
        Ok(first.coefficient().clone())
    } else if second.time() == time {
        Ok(second.coefficient().clone())
    } else {
        let alpha = interpolation_weight(first.time(), second.time(), time);
        Ok(V::interpolate(first.coefficient(), second.coefficient(), alpha))
    }
}

pub fn evaluate_derivative<V>(
    manager: &CoefficientManager<V>,
    time: Time,
    derivative_order: u32
) -> Result<V::Derivative, CurveError>
    where V: Coefficient {
    if derivative_order == 0 {
        return Err(CurveError::PreconditionViolation("derivative order must be at least 1".to_owned()));
    }
    if manager.len() < 2 {
        return Err(CurveError::not_enough_coefficients(2, manager.len()));
    }
    let (first, second) = manager.coefficients_at(time)?;
    if derivative_order > 1 {
        return Ok(first.coefficient().zero_derivative());
    }
    let dt = time_span(first.time(), second.time());
    Ok(V::finite_difference(first.coefficient(), second.coefficient(), dt))
}
