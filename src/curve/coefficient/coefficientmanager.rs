use std::collections::{
    BTreeMap,
    HashMap
};
use std::ops::Bound::{
    Excluded,
    Unbounded
};

use log::debug;

use crate::curve::coefficient::key::{
    next_key,
    Key
};
use crate::curve::curve::Time;
use crate::curve::curveerror::CurveError;

#[derive(Clone, Debug, PartialEq)]
pub struct KeyCoefficientTime<V> {
    key: Key,
    coefficient: V,
    time: Time
}

impl<V> KeyCoefficientTime<V> {
    pub fn key(&self) -> Key {
        self.key
    }

    pub fn coefficient(&self) -> &V {
        &self.coefficient
    }

    pub fn time(&self) -> Time {
        self.time
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CoefficientManager
// ─────────────────────────────────────────────────────────────────────────────
//
// 雙索引結構：
//   time_to_coefficient：依時間排序，負責區間與相鄰係數查詢
//   key_to_time        ：Key → Time，負責依 Key 存取
//
// 兩個索引只在本檔的 mutator 中同步更新，對外不暴露可變參考。

/// Sparse, time-ordered store of curve coefficients where each coefficient
/// has at most two neighbours contributing to any evaluation.
#[derive(Clone, Debug)]
pub struct CoefficientManager<V> {
    time_to_coefficient: BTreeMap<Time, KeyCoefficientTime<V>>,
    key_to_time: HashMap<Key, Time>
}

impl<V> Default for CoefficientManager<V> {
    fn default() -> Self {
        CoefficientManager::new()
    }
}

impl<V> CoefficientManager<V> {
    pub fn new() -> CoefficientManager<V> {
        CoefficientManager {
            time_to_coefficient: BTreeMap::new(),
            key_to_time: HashMap::new()
        }
    }

    pub fn len(&self) -> usize {
        self.time_to_coefficient.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_to_coefficient.is_empty()
    }

    pub fn clear(&mut self) {
        self.time_to_coefficient.clear();
        self.key_to_time.clear();
    }

    pub fn has_coefficient_at_time(&self, time: Time) -> bool {
        self.time_to_coefficient.contains_key(&time)
    }

    pub fn has_coefficient_with_key(&self, key: Key) -> bool {
        self.key_to_time.contains_key(&key)
    }

    /// Earliest coefficient time, `None` when empty.
    pub fn front_time(&self) -> Option<Time> {
        self.time_to_coefficient.keys().next().copied()
    }

    /// Latest coefficient time, `None` when empty.
    pub fn back_time(&self) -> Option<Time> {
        self.time_to_coefficient.keys().next_back().copied()
    }

    pub fn coefficient_front(&self) -> Option<&KeyCoefficientTime<V>> {
        self.time_to_coefficient.values().next()
    }

    /// The most recent coefficient. The extend policies slide this entry
    /// forward when decimating.
    pub fn coefficient_back(&self) -> Option<&KeyCoefficientTime<V>> {
        self.time_to_coefficient.values().next_back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &KeyCoefficientTime<V>> {
        self.time_to_coefficient.values()
    }

    pub fn times(&self) -> Vec<Time> {
        self.time_to_coefficient.keys().copied().collect()
    }

    /// Keys in ascending time order.
    pub fn keys(&self) -> Vec<Key> {
        self.time_to_coefficient.values().map(|c| c.key).collect()
    }

    pub fn time_at_key(&self, key: Key) -> Result<Time, CurveError> {
        self.key_to_time
            .get(&key)
            .copied()
            .ok_or_else(|| CurveError::key_not_found(key))
    }

    pub fn coefficient_by_key(&self, key: Key) -> Result<&V, CurveError> {
        let time = self.time_at_key(key)?;
        self.time_to_coefficient
            .get(&time)
            .map(|c| &c.coefficient)
            .ok_or_else(|| CurveError::key_not_found(key))
    }

    pub fn set_coefficient_by_key(&mut self, key: Key, value: V) -> Result<(), CurveError> {
        let time = self.time_at_key(key)?;
        let entry = self.time_to_coefficient
            .get_mut(&time)
            .ok_or_else(|| CurveError::key_not_found(key))?;
        entry.coefficient = value;
        Ok(())
    }

    /// Appends one coefficient. `time` must lie after every stored time.
    pub fn add_coefficient_at_end(&mut self, time: Time, value: V) -> Result<Key, CurveError> {
        if let Some(back_time) = self.back_time() {
            if time <= back_time {
                return Err(CurveError::PreconditionViolation(format!(
                    "time {} is not after the last coefficient at {}",
                    time, back_time
                )));
            }
        }
        Ok(self.insert_unchecked(time, value))
    }

    pub fn insert_coefficient(&mut self, time: Time, value: V) -> Result<Key, CurveError> {
        if self.has_coefficient_at_time(time) {
            return Err(CurveError::time_already_present(time));
        }
        Ok(self.insert_unchecked(time, value))
    }

    /// Batch insertion. The batch is validated as a whole before anything is
    /// stored, so a failing call leaves the manager untouched. Returns the
    /// freshly assigned keys in input order.
    pub fn insert_coefficients(&mut self, times: &[Time], values: &[V]) -> Result<Vec<Key>, CurveError>
        where V: Clone {
        Self::check_batch(times, values)?;
        if let Some(&time) = times.iter().find(|t| self.has_coefficient_at_time(**t)) {
            return Err(CurveError::time_already_present(time));
        }
        debug!("inserting {} coefficients", times.len());
        Ok(times
            .iter()
            .zip(values.iter())
            .map(|(&time, value)| self.insert_unchecked(time, value.clone()))
            .collect())
    }

    /// Like `insert_coefficients`, but a time that is already stored has its
    /// value replaced in place and keeps its key.
    pub fn insert_or_update_coefficients(&mut self, times: &[Time], values: &[V]) -> Result<Vec<Key>, CurveError>
        where V: Clone {
        Self::check_batch(times, values)?;
        Ok(times
            .iter()
            .zip(values.iter())
            .map(|(&time, value)| match self.time_to_coefficient.get_mut(&time) {
                Some(entry) => {
                    entry.coefficient = value.clone();
                    entry.key
                },
                None => self.insert_unchecked(time, value.clone())
            })
            .collect())
    }

    /// Replaces the coefficient stored at `time` with `new_value` and moves it
    /// to `new_time`. The key is preserved.
    pub fn modify_coefficient(&mut self, time: Time, new_time: Time, new_value: V) -> Result<(), CurveError> {
        if !self.has_coefficient_at_time(time) {
            return Err(CurveError::NotFound(format!("no coefficient at time {}", time)));
        }
        if new_time != time && self.has_coefficient_at_time(new_time) {
            return Err(CurveError::time_already_present(new_time));
        }
        let Some(mut entry) = self.time_to_coefficient.remove(&time) else {
            return Err(CurveError::NotFound(format!("no coefficient at time {}", time)));
        };
        entry.time = new_time;
        entry.coefficient = new_value;
        self.key_to_time.insert(entry.key, new_time);
        self.time_to_coefficient.insert(new_time, entry);
        Ok(())
    }

    /// Writes every value of `coefficients` to the entry with the same key.
    /// Fails without writing anything if one of the keys is unknown.
    pub fn set_coefficients(&mut self, coefficients: &BTreeMap<Key, V>) -> Result<(), CurveError>
        where V: Clone {
        if let Some(key) = coefficients.keys().find(|k| !self.has_coefficient_with_key(**k)) {
            return Err(CurveError::key_not_found(*key));
        }
        for (key, value) in coefficients.iter() {
            self.set_coefficient_by_key(*key, value.clone())?;
        }
        Ok(())
    }

    /// Replaces every stored value by `f(value)`. Keys and times are untouched.
    pub fn transform_coefficients<F>(&mut self, mut f: F)
        where F: FnMut(&V) -> V {
        for entry in self.time_to_coefficient.values_mut() {
            entry.coefficient = f(&entry.coefficient);
        }
    }

    pub fn coefficients(&self) -> BTreeMap<Key, V>
        where V: Clone {
        self.time_to_coefficient
            .values()
            .map(|c| (c.key, c.coefficient.clone()))
            .collect()
    }

    /// The pair of coefficients that supports `time`.
    ///
    /// - `time` strictly between two coefficients: those two;
    /// - `time` on a coefficient that is not the last: it and the next one;
    /// - `time` on the last coefficient: the one before it and the last
    ///   (both entries are the same when the curve holds a single coefficient).
    ///
    /// Fails with `NotFound` before the first or after the last coefficient.
    pub fn coefficients_at(&self, time: Time) -> Result<(&KeyCoefficientTime<V>, &KeyCoefficientTime<V>), CurveError> {
        let back = self.coefficient_back().ok_or_else(|| CurveError::time_out_of_range(time))?;
        if time == back.time {
            let first = self.time_to_coefficient
                .range(..time)
                .next_back()
                .map_or(back, |(_, c)| c);
            return Ok((first, back));
        }
        let second = self.time_to_coefficient
            .range((Excluded(time), Unbounded))
            .next()
            .map(|(_, c)| c)
            .ok_or_else(|| CurveError::time_out_of_range(time))?;
        let first = self.time_to_coefficient
            .range(..=time)
            .next_back()
            .map(|(_, c)| c)
            .ok_or_else(|| CurveError::time_out_of_range(time))?;
        Ok((first, second))
    }

    /// Every coefficient needed to evaluate the curve on `[start_time,
    /// end_time]`. The range is clamped to the curve extent; a range that
    /// misses the curve entirely yields an empty map.
    pub fn coefficients_in_range(&self, start_time: Time, end_time: Time) -> BTreeMap<Key, V>
        where V: Clone {
        let (Some(front_time), Some(back_time)) = (self.front_time(), self.back_time()) else {
            return BTreeMap::new();
        };
        if start_time > end_time || start_time > back_time || end_time < front_time {
            return BTreeMap::new();
        }
        let start_time = start_time.max(front_time);
        let end_time = end_time.min(back_time);
        let first_time = self.time_to_coefficient
            .range(..=start_time)
            .next_back()
            .map_or(front_time, |(t, _)| *t);
        let last_time = self.time_to_coefficient
            .range(end_time..)
            .next()
            .map_or(back_time, |(t, _)| *t);
        self.time_to_coefficient
            .range(first_time..=last_time)
            .map(|(_, c)| (c.key, c.coefficient.clone()))
            .collect()
    }

    fn check_batch(times: &[Time], values: &[V]) -> Result<(), CurveError> {
        if times.len() != values.len() {
            return Err(CurveError::length_mismatch(times.len(), values.len()));
        }
        if let Some(pair) = times.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(CurveError::PreconditionViolation(format!(
                "times must be strictly increasing, got {} followed by {}",
                pair[0], pair[1]
            )));
        }
        Ok(())
    }

    fn insert_unchecked(&mut self, time: Time, value: V) -> Key {
        let key = next_key();
        self.key_to_time.insert(key, time);
        self.time_to_coefficient.insert(time, KeyCoefficientTime { key, coefficient: value, time });
        key
    }
}
