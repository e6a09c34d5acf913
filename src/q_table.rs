//! Dense action-value table

use ndarray::{Array2, ArrayView1};
use ordered_float::OrderedFloat;

use crate::codec::NUM_ACTIONS;

/// Q-values indexed by `[state, action]`, all zero at creation. The shape is
/// fixed for the lifetime of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Array2<f64>,
}

impl QTable {
    pub fn new(num_states: usize) -> Self {
        Self {
            values: Array2::zeros((num_states, NUM_ACTIONS)),
        }
    }

    pub fn num_states(&self) -> usize {
        self.values.nrows()
    }

    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.values[[state, action]]
    }

    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        self.values[[state, action]] = value;
    }

    pub fn row(&self, state: usize) -> ArrayView1<'_, f64> {
        self.values.row(state)
    }

    /// Largest value in the row of `state`.
    pub fn max_value(&self, state: usize) -> f64 {
        self.values
            .row(state)
            .iter()
            .map(|v| OrderedFloat(*v))
            .max()
            .map_or(0.0, |v| v.into_inner())
    }

    /// Action with the largest value. Ties go to the lowest action id.
    pub fn greedy_action(&self, state: usize) -> usize {
        self.values
            .row(state)
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(best, best_value), (action, value)| {
                if *value > best_value {
                    (action, *value)
                } else {
                    (best, best_value)
                }
            })
            .0
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed_with_four_actions() {
        let table = QTable::new(56);
        assert_eq!(table.as_array().dim(), (56, 4));
        assert!(table.as_array().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn greedy_action_prefers_first_maximum() {
        let mut table = QTable::new(3);
        for (action, value) in [3.0, 1.0, 3.0, 2.0].iter().enumerate() {
            table.set(1, action, *value);
        }
        for _ in 0..10 {
            assert_eq!(table.greedy_action(1), 0);
        }
        assert_eq!(table.max_value(1), 3.0);
    }

    #[test]
    fn greedy_action_on_zero_row_is_up() {
        let table = QTable::new(2);
        assert_eq!(table.greedy_action(0), 0);
    }

    #[test]
    fn max_value_handles_negative_rows() {
        let mut table = QTable::new(1);
        for action in 0..4 {
            table.set(0, action, -(action as f64) - 1.0);
        }
        assert_eq!(table.max_value(0), -1.0);
        assert_eq!(table.greedy_action(0), 0);
        assert_eq!(table.row(0).len(), 4);
    }
}
