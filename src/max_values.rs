use std::collections::BTreeMap;

use crate::category::CategoryKey;

/// Running maximum per category, used to size axis domains.
///
/// A category only gets an entry once a value above its family's
/// "nothing observed" sentinel has been recorded, so an absent entry and a
/// sentinel maximum mean the same thing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaxValueTracker {
    maxima: BTreeMap<CategoryKey, f64>,
}

impl MaxValueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the stored maximum for `key` if `candidate` exceeds it.
    pub fn record_observation(&mut self, key: &CategoryKey, candidate: f64) {
        if !candidate.is_finite() {
            return;
        }
        let current = self
            .maxima
            .get(key)
            .copied()
            .unwrap_or_else(|| key.family().sentinel());
        if candidate > current {
            self.maxima.insert(key.clone(), candidate);
        }
    }

    /// Stored maximum, `None` while nothing usable has been seen.
    pub fn get(&self, key: &CategoryKey) -> Option<f64> {
        self.maxima.get(key).copied()
    }

    pub fn is_usable(&self, key: &CategoryKey) -> bool {
        self.get(key)
            .is_some_and(|max| max > key.family().sentinel())
    }

    /// Keep only the categories that received a usable value, preserving order.
    pub fn filter_usable<'a, I>(&self, keys: I) -> Vec<CategoryKey>
    where
        I: IntoIterator<Item = &'a CategoryKey>,
    {
        keys.into_iter()
            .filter(|k| self.is_usable(k))
            .cloned()
            .collect()
    }

    /// Replace the maximum of `key` wholesale, e.g. after a unit change.
    pub fn reset_to(&mut self, key: &CategoryKey, value: Option<f64>) {
        self.maxima.remove(key);
        if let Some(v) = value {
            self.record_observation(key, v);
        }
    }

    /// Snapshot of every usable maximum.
    pub fn usable(&self) -> BTreeMap<CategoryKey, f64> {
        self.maxima
            .iter()
            .filter(|(k, v)| **v > k.family().sentinel())
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}
