//! Cartesian expansion of list-valued row cells.

use std::collections::BTreeSet;

use serde_json::Value;

/// Positions of the list-valued cells in a row.
pub fn list_positions(row: &[Value]) -> BTreeSet<usize> {
    row.iter()
        .enumerate()
        .filter(|(_, v)| v.is_array())
        .map(|(i, _)| i)
        .collect()
}

/// Expand the list cells at `list_positions` into one row per combination.
///
/// The leftmost position varies slowest. Positions that are out of range or
/// not lists are held fixed like any scalar cell. An empty list at any
/// position yields no rows; an empty position set yields the row once.
pub fn expand<'a>(row: &'a [Value], list_positions: &BTreeSet<usize>) -> Permutations<'a> {
    let slots: Vec<(usize, &'a [Value])> = list_positions
        .iter()
        .filter_map(|&i| row.get(i)?.as_array().map(|a| (i, a.as_slice())))
        .collect();
    let done = slots.iter().any(|(_, list)| list.is_empty());
    Permutations {
        row,
        cursor: vec![0; slots.len()],
        slots,
        done,
    }
}

/// Iterator returned by [`expand`].
#[derive(Debug, Clone)]
pub struct Permutations<'a> {
    row: &'a [Value],
    slots: Vec<(usize, &'a [Value])>,
    cursor: Vec<usize>,
    done: bool,
}

impl Iterator for Permutations<'_> {
    type Item = Vec<Value>;

    fn next(&mut self) -> Option<Vec<Value>> {
        if self.done {
            return None;
        }
        let mut out = self.row.to_vec();
        for ((pos, list), &idx) in self.slots.iter().zip(&self.cursor) {
            out[*pos] = list[idx].clone();
        }

        // Odometer step, rightmost slot first.
        self.done = true;
        for (slot, idx) in self.cursor.iter_mut().enumerate().rev() {
            *idx += 1;
            if *idx < self.slots[slot].1.len() {
                self.done = false;
                break;
            }
            *idx = 0;
        }
        Some(out)
    }
}
