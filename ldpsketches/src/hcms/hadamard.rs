// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::error::Error;

/// Largest order whose entries are tabulated; larger matrices compute entries on demand.
const MAX_TABULATED_ORDER: u32 = 1 << 12;

/// The Sylvester Hadamard matrix of a power-of-two order `m`.
///
/// Entry `(i, j)` is `(-1)^popcount(i & j)`. The matrix is symmetric, so a column is read as
/// the row with the same index. Up to order 4096 the entries are tabulated once at
/// construction (16 MiB at that order); above it they are derived from the same formula on
/// each access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HadamardMatrix {
    order: u32,
    entries: Option<Vec<i8>>,
}

impl HadamardMatrix {
    /// Builds the matrix of order `order`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if `order` is not a
    /// power of two.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ldpsketches::hcms::HadamardMatrix;
    /// let h = HadamardMatrix::new(4).unwrap();
    /// assert_eq!(h.entry(1, 1), -1);
    /// assert_eq!(h.entry(3, 0), 1);
    /// assert!(HadamardMatrix::new(10).is_err());
    /// ```
    pub fn new(order: u32) -> Result<Self, Error> {
        if !order.is_power_of_two() {
            return Err(Error::config("Hadamard order must be a power of two")
                .with_context("order", order));
        }
        let entries = (order <= MAX_TABULATED_ORDER).then(|| {
            let m = order as usize;
            let mut entries = Vec::with_capacity(m * m);
            for row in 0..order {
                entries.extend((0..order).map(|col| sylvester_entry(row, col)));
            }
            entries
        });
        Ok(Self { order, entries })
    }

    /// Returns the order `m`.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Returns entry `(row, col)`, `-1` or `+1`.
    pub fn entry(&self, row: usize, col: usize) -> i8 {
        match &self.entries {
            Some(entries) => entries[row * self.order as usize + col],
            None => sylvester_entry(row as u32, col as u32),
        }
    }
}

fn sylvester_entry(row: u32, col: u32) -> i8 {
    if (row & col).count_ones() % 2 == 0 { 1 } else { -1 }
}

/// In-place unnormalized fast Walsh–Hadamard transform: `values <- H · values`.
///
/// `values.len()` must be a power of two.
pub(crate) fn walsh_hadamard_transform(values: &mut [f64]) {
    debug_assert!(values.len().is_power_of_two());
    let mut half = 1;
    while half < values.len() {
        for block in values.chunks_exact_mut(half * 2) {
            let (left, right) = block.split_at_mut(half);
            for (a, b) in left.iter_mut().zip(right.iter_mut()) {
                let (x, y) = (*a, *b);
                *a = x + y;
                *b = x - y;
            }
        }
        half *= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_orthogonal() {
        let h = HadamardMatrix::new(16).unwrap();
        for a in 0..16 {
            for b in 0..16 {
                let dot: i32 = (0..16)
                    .map(|k| i32::from(h.entry(a, k)) * i32::from(h.entry(b, k)))
                    .sum();
                assert_eq!(dot, if a == b { 16 } else { 0 });
            }
        }
    }

    #[test]
    fn test_symmetric() {
        let h = HadamardMatrix::new(32).unwrap();
        for a in 0..32 {
            for b in 0..32 {
                assert_eq!(h.entry(a, b), h.entry(b, a));
            }
        }
    }

    #[test]
    fn test_untabulated_matches_formula() {
        let h = HadamardMatrix::new(MAX_TABULATED_ORDER * 2).unwrap();
        assert!(h.entries.is_none());
        assert_eq!(h.entry(0, 8191), 1);
        assert_eq!(h.entry(8191, 8191), -1);
        assert_eq!(h.entry(3, 1), -1);
        assert_eq!(h.entry(3, 3), 1);
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        for order in [0, 3, 10, 100] {
            assert!(HadamardMatrix::new(order).is_err(), "order {order}");
        }
        assert!(HadamardMatrix::new(1).is_ok());
        assert!(HadamardMatrix::new(16).is_ok());
    }

    #[test]
    fn test_fast_transform_matches_matrix_product() {
        let h = HadamardMatrix::new(8).unwrap();
        let input = [1.0, -2.0, 0.5, 3.0, 0.0, 4.0, -1.5, 2.0];
        let mut fast = input;
        walsh_hadamard_transform(&mut fast);
        for (row, value) in fast.iter().enumerate() {
            let expected: f64 = (0..8)
                .map(|col| f64::from(h.entry(row, col)) * input[col])
                .sum();
            assert!((value - expected).abs() < 1e-12);
        }
    }
}
