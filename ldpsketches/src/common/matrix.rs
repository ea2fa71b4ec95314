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

/// Dense row-major `f64` matrix backing every oracle sketch.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SketchMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl SketchMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0.0; rows * cols],
        }
    }

    /// Wraps decoded cells. `cells.len()` must equal `rows * cols`.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<f64>) -> Self {
        debug_assert_eq!(cells.len(), rows * cols);
        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.cells[start..start + self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.cols;
        &mut self.cells[start..start + self.cols]
    }

    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.cells[row * self.cols + col] += value;
    }

    pub fn add_row(&mut self, row: usize, values: &[f64]) {
        let start = row * self.cols;
        for (cell, value) in self.cells[start..start + self.cols].iter_mut().zip(values) {
            *cell += *value;
        }
    }

    /// Elementwise sum. Shapes must match.
    pub fn merge(&mut self, other: &SketchMatrix) {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        for (cell, value) in self.cells.iter_mut().zip(&other.cells) {
            *cell += *value;
        }
    }

    pub fn reset(&mut self) {
        self.cells.fill(0.0);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let mut matrix = SketchMatrix::zeros(2, 3);
        matrix.add_row(1, &[1.0, 2.0, 3.0]);
        matrix.add(0, 2, 5.0);
        assert_eq!(matrix.as_slice(), &[0.0, 0.0, 5.0, 1.0, 2.0, 3.0]);
        assert_eq!(matrix.row(1), &[1.0, 2.0, 3.0]);
        assert_eq!(matrix.get(0, 2), 5.0);
    }

    #[test]
    fn test_merge_and_reset() {
        let mut a = SketchMatrix::zeros(1, 2);
        let mut b = SketchMatrix::zeros(1, 2);
        a.add_row(0, &[1.0, -1.0]);
        b.add_row(0, &[0.5, 0.5]);
        a.merge(&b);
        assert_eq!(a.as_slice(), &[1.5, -0.5]);
        a.reset();
        assert_eq!(a.as_slice(), &[0.0, 0.0]);
    }
}
