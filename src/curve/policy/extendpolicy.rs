use log::trace;

use crate::curve::coefficient::coefficientmanager::CoefficientManager;
use crate::curve::coefficient::key::Key;
use crate::curve::curve::Time;
use crate::curve::curveerror::CurveError;

/// 決定新樣本如何變成曲線係數。
///
/// The curve hands its manager to the policy for the duration of a single
/// `extend` call; the policy never keeps a reference to the curve.
pub trait ExtendPolicy<V> {
    /// Returns the keys of the coefficients created by this call. A sample
    /// that overwrites an existing coefficient adds no key.
    fn extend(
        &mut self,
        times: &[Time],
        values: &[V],
        manager: &mut CoefficientManager<V>
    ) -> Result<Vec<Key>, CurveError>;

    /// Forget any streaming state, called when the curve is refitted or cleared.
    fn reset(&mut self) {}
}

/// Every sample becomes a coefficient.
#[derive(Clone, Copy, Debug, Default)]
pub struct AppendPolicy;

impl<V: Clone> ExtendPolicy<V> for AppendPolicy {
    fn extend(
        &mut self,
        times: &[Time],
        values: &[V],
        manager: &mut CoefficientManager<V>
    ) -> Result<Vec<Key>, CurveError> {
        if times.len() != values.len() {
            return Err(CurveError::length_mismatch(times.len(), values.len()));
        }
        if times.len() == 1 && manager.len() >= 2 {
            trace!("appending coefficient at {}", times[0]);
            return Ok(vec![manager.add_coefficient_at_end(times[0], values[0].clone())?]);
        }
        manager.insert_coefficients(times, values)
    }
}

/// For curve variants that cannot be extended.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnimplementedPolicy;

impl<V> ExtendPolicy<V> for UnimplementedPolicy {
    fn extend(
        &mut self,
        _times: &[Time],
        _values: &[V],
        _manager: &mut CoefficientManager<V>
    ) -> Result<Vec<Key>, CurveError> {
        Err(CurveError::Unimplemented("extend is not supported by this curve"))
    }
}
