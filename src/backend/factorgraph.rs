use crate::curve::coefficient::key::Key;

/// Anchors one variable at a fixed value.
#[derive(Clone, Debug, PartialEq)]
pub struct PriorFactor<V> {
    key: Key,
    prior: V
}

impl<V> PriorFactor<V> {
    pub fn new(key: Key, prior: V) -> PriorFactor<V> {
        PriorFactor { key, prior }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn prior(&self) -> &V {
        &self.prior
    }
}

/// The constraints a curve contributes to the back-end's problem.
#[derive(Clone, Debug)]
pub struct FactorGraph<V> {
    factors: Vec<PriorFactor<V>>
}

impl<V> Default for FactorGraph<V> {
    fn default() -> Self {
        FactorGraph::new()
    }
}

impl<V> FactorGraph<V> {
    pub fn new() -> FactorGraph<V> {
        FactorGraph { factors: Vec::new() }
    }

    pub fn push(&mut self, factor: PriorFactor<V>) {
        self.factors.push(factor);
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn factors(&self) -> &[PriorFactor<V>] {
        &self.factors
    }

    pub fn keys(&self) -> Vec<Key> {
        self.factors.iter().map(|f| f.key).collect()
    }
}
