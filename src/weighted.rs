//! Weighted random selection over a finite value set.

use crate::error::DrkError;
use crate::sampler;
use crate::value::Value;

#[derive(Clone, Debug)]
struct WeightedItem {
    value: Value,
    weight: i64,
}

/// A precomputed weighted item set. Order is preserved from the input,
/// which makes `choose` deterministic with respect to its random draw
/// (first item whose cumulative weight reaches the draw wins ties).
#[derive(Clone, Debug)]
pub struct WeightedItems {
    items: Vec<WeightedItem>,
    total_weight: i64,
}

/// `base = floor(100 / n)`, with the first `100 mod n` entries receiving
/// `base + 1` so the full set sums to exactly 100.
pub fn default_weights(n: usize) -> Vec<i64> {
    assert!(n > 0, "default_weights requires at least one item");
    let base = 100 / n as i64;
    let remainder = 100 % n as i64;

    (0..n as i64)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

pub fn build_weighted_items(values: Vec<Value>, weights: Option<Vec<i64>>) -> Result<WeightedItems, DrkError> {
    let weights = match weights {
        Some(w) => w,
        None => default_weights(values.len()),
    };

    if values.len() != weights.len() {
        return Err(DrkError::WeightLengthMismatch {
            values: values.len(),
            weights: weights.len(),
        });
    }

    let items: Vec<WeightedItem> = values
        .into_iter()
        .zip(weights)
        .map(|(value, weight)| WeightedItem { value, weight })
        .collect();
    let total_weight = items.iter().map(|i| i.weight).sum();

    Ok(WeightedItems { items, total_weight })
}

impl WeightedItems {
    /// Draws an integer uniformly in `[1, total_weight]` and returns the
    /// first item whose cumulative weight subtraction drives the draw to
    /// zero or below. Zero-weight items are never returned while
    /// `total_weight > 0`.
    pub fn choose(&self) -> Value {
        let mut remaining = sampler::int(1, self.total_weight + 1);
        for item in &self.items {
            remaining -= item.weight;
            if remaining <= 0 {
                return item.value.clone();
            }
        }
        // Unreachable as long as total_weight == sum(weights), which
        // build_weighted_items guarantees.
        self.items
            .last()
            .map(|i| i.value.clone())
            .unwrap_or(Value::Null)
    }
}
