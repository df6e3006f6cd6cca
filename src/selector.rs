//! Weighted random selection over an ordered set of values.

use crate::error::{RespawnError, Result};
use rand::Rng;

/// Values keyed by the running sum of their weights, in insertion order.
///
/// A draw samples `[0, total)` and picks the first entry whose cumulative
/// boundary is at or above the sample.
#[derive(Debug, Clone)]
pub struct WeightedSelector<T> {
    entries: Vec<(f64, T)>,
    total: f64,
}

impl<T> WeightedSelector<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            total: 0.0,
        }
    }

    /// Append `value`, extending the cumulative range by `weight`.
    pub fn add(&mut self, weight: f64, value: T) -> Result<()> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(RespawnError::InvalidWeight(weight));
        }
        self.total += weight;
        self.entries.push((self.total, value));
        Ok(())
    }

    pub fn draw(&self) -> Option<&T> {
        self.draw_with(&mut rand::thread_rng())
    }

    pub fn draw_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        if self.entries.is_empty() {
            return None;
        }
        let sample = rng.gen::<f64>() * self.total;
        Some(self.resolve(sample))
    }

    /// Ceiling lookup. Anything past the last boundary (float rounding)
    /// resolves to the last entry.
    fn resolve(&self, sample: f64) -> &T {
        let idx = self
            .entries
            .partition_point(|(boundary, _)| *boundary < sample)
            .min(self.entries.len() - 1);
        &self.entries[idx].1
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total = 0.0;
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }
}

impl<T> Default for WeightedSelector<T> {
    fn default() -> Self {
        Self::new()
    }
}
