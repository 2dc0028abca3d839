use log::trace;

use crate::configuration::SamplingPolicyConfig;
use crate::curve::coefficient::coefficientmanager::CoefficientManager;
use crate::curve::coefficient::key::Key;
use crate::curve::curve::Time;
use crate::curve::curveerror::CurveError;
use crate::curve::policy::extendpolicy::ExtendPolicy;

/// Bootstrap-and-decimate extend policy.
///
/// # 單一樣本（串流）
/// - 曲線少於兩個係數：直接插入。
/// - 與最後一個係數的間隔小於 `min_sampling_period`：捨棄該樣本。
/// - `minimum_measurements == 1`：每個樣本都附加到尾端。
/// - 否則每 `minimum_measurements` 個樣本為一輪：第一個附加新係數，
///   其餘覆寫最後一個係數（時間與值），使尾端永遠反映最新的觀測。
///
/// # 多個樣本（批次）
/// 不做抽樣，僅移除批次內彼此間隔小於 `min_sampling_period` 的樣本後整批插入。
#[derive(Clone, Debug)]
pub struct SamplingPolicy {
    minimum_measurements: u32,
    min_sampling_period: Time,
    measurements_since_last_extend: u32
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        SamplingPolicy::new()
    }
}

impl SamplingPolicy {
    pub fn new() -> SamplingPolicy {
        SamplingPolicy {
            minimum_measurements: 1,
            min_sampling_period: 0,
            measurements_since_last_extend: 0
        }
    }

    pub fn with_parameters(minimum_measurements: u32, min_sampling_period: Time) -> Result<SamplingPolicy, CurveError> {
        let mut policy = SamplingPolicy::new();
        policy.set_minimum_measurements(minimum_measurements)?;
        policy.set_min_sampling_period(min_sampling_period)?;
        Ok(policy)
    }

    pub fn from_config(config: &SamplingPolicyConfig) -> Result<SamplingPolicy, CurveError> {
        SamplingPolicy::with_parameters(config.minimum_measurements(), config.min_sampling_period())
    }

    pub fn minimum_measurements(&self) -> u32 {
        self.minimum_measurements
    }

    pub fn min_sampling_period(&self) -> Time {
        self.min_sampling_period
    }

    pub fn measurements_since_last_extend(&self) -> u32 {
        self.measurements_since_last_extend
    }

    /// eg. 4 keeps one coefficient for every 4 streamed samples.
    pub fn set_minimum_measurements(&mut self, minimum_measurements: u32) -> Result<(), CurveError> {
        if minimum_measurements == 0 {
            return Err(CurveError::PreconditionViolation("minimum measurements must be at least 1".to_owned()));
        }
        self.minimum_measurements = minimum_measurements;
        self.measurements_since_last_extend = 0;
        Ok(())
    }

    pub fn set_min_sampling_period(&mut self, min_sampling_period: Time) -> Result<(), CurveError> {
        if min_sampling_period < 0 {
            return Err(CurveError::PreconditionViolation(format!(
                "minimum sampling period must not be negative, got {}",
                min_sampling_period
            )));
        }
        self.min_sampling_period = min_sampling_period;
        Ok(())
    }

    // 差值溢位代表間隔超過 i64::MAX，必定不小於週期
    fn within_period(&self, earlier: Time, later: Time) -> bool {
        later
            .checked_sub(earlier)
            .is_some_and(|gap| gap < self.min_sampling_period)
    }

    fn thin_batch<V: Clone>(&self, times: &[Time], values: &[V]) -> (Vec<Time>, Vec<V>) {
        if self.min_sampling_period == 0 {
            return (times.to_vec(), values.to_vec());
        }
        let mut kept_times: Vec<Time> = Vec::with_capacity(times.len());
        let mut kept_values: Vec<V> = Vec::with_capacity(values.len());
        for (&time, value) in times.iter().zip(values.iter()) {
            let too_close = kept_times
                .last()
                .is_some_and(|&last| time > last && self.within_period(last, time));
            if too_close {
                trace!("dropping batch sample at {}: closer than {} to the previous sample", time, self.min_sampling_period);
                continue;
            }
            kept_times.push(time);
            kept_values.push(value.clone());
        }
        (kept_times, kept_values)
    }

    fn extend_single<V: Clone>(
        &mut self,
        time: Time,
        value: &V,
        manager: &mut CoefficientManager<V>
    ) -> Result<Vec<Key>, CurveError> {
        if manager.len() < 2 {
            trace!("bootstrapping curve with coefficient at {}", time);
            return Ok(vec![manager.insert_coefficient(time, value.clone())?]);
        }

        let back_time = manager.back_time().ok_or_else(|| CurveError::not_enough_coefficients(2, 0))?;
        if time <= back_time {
            return Err(CurveError::PreconditionViolation(format!(
                "time {} is not after the last coefficient at {}",
                time, back_time
            )));
        }
        if self.within_period(back_time, time) {
            trace!("dropping sample at {}: closer than {} to the last coefficient", time, self.min_sampling_period);
            return Ok(Vec::new());
        }

        if self.minimum_measurements == 1 {
            trace!("appending coefficient at {}", time);
            return Ok(vec![manager.add_coefficient_at_end(time, value.clone())?]);
        }

        let keys = if self.measurements_since_last_extend == 0 {
            trace!("appending coefficient at {}", time);
            vec![manager.add_coefficient_at_end(time, value.clone())?]
        } else {
            trace!("sliding last coefficient from {} to {}", back_time, time);
            manager.modify_coefficient(back_time, time, value.clone())?;
            Vec::new()
        };

        self.measurements_since_last_extend += 1;
        if self.measurements_since_last_extend == self.minimum_measurements {
            self.measurements_since_last_extend = 0;
        }
        Ok(keys)
    }
}

impl<V: Clone> ExtendPolicy<V> for SamplingPolicy {
    fn extend(
        &mut self,
        times: &[Time],
        values: &[V],
        manager: &mut CoefficientManager<V>
    ) -> Result<Vec<Key>, CurveError> {
        if times.len() != values.len() {
            return Err(CurveError::length_mismatch(times.len(), values.len()));
        }
        match times.len() {
            0 => Ok(Vec::new()),
            1 => self.extend_single(times[0], &values[0], manager),
            _ => {
                let (times, values) = self.thin_batch(times, values);
                manager.insert_coefficients(&times, &values)
            }
        }
    }

    fn reset(&mut self) {
        self.measurements_since_last_extend = 0;
    }
}
