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

use tracing::debug;

use super::PcsReport;
use crate::codec::family::Family;
use crate::codec::matrix;
use crate::common::SketchMatrix;
use crate::error::Error;
use crate::hash::CanonicalItem;
use crate::oracle::FrequencySketch;
use crate::oracle::OracleConfig;
use crate::oracle::ensure_repetition;
use crate::oracle::ensure_unit_sign;

/// Server-side Private Count Sketch.
///
/// Holds an `l × w` matrix of summed reports. See the [module documentation](super) for the
/// estimator.
#[derive(Debug, Clone)]
pub struct PcsSketch {
    config: OracleConfig,
    /// `(e^ε + 1) / (e^ε - 1)`
    debias: f64,
    matrix: SketchMatrix,
    num_reports: u64,
}

impl PcsSketch {
    /// Creates an empty sketch for `config`.
    pub fn new(config: OracleConfig) -> Self {
        let matrix = SketchMatrix::zeros(config.repetitions() as usize, config.width() as usize);
        debug!(
            repetitions = config.repetitions(),
            width = config.width(),
            "created PCS sketch"
        );
        Self::with_matrix(config, matrix, 0)
    }

    fn with_matrix(config: OracleConfig, matrix: SketchMatrix, num_reports: u64) -> Self {
        let debias = config.budget().sign_debias_factor();
        Self {
            config,
            debias,
            matrix,
            num_reports,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Returns ε.
    pub fn epsilon(&self) -> f64 {
        self.config.epsilon()
    }

    /// Returns the number of repetitions `l`.
    pub fn num_repetitions(&self) -> u32 {
        self.config.repetitions()
    }

    /// Returns the width `w`.
    pub fn width(&self) -> u32 {
        self.config.width()
    }

    /// Returns the raw sketch, row-major.
    pub fn as_slice(&self) -> &[f64] {
        self.matrix.as_slice()
    }

    /// Returns the median across repetitions of the per-repetition estimates.
    ///
    /// Less sensitive than [`estimate`](FrequencySketch::estimate) to a repetition in which
    /// the item collides with a heavy item, at the price of a higher variance.
    pub fn estimate_median<I: CanonicalItem + ?Sized>(&self, item: &I) -> Result<f64, Error> {
        let mut per_row = self.row_estimates(item)?;
        per_row.sort_by(f64::total_cmp);
        let mid = per_row.len() / 2;
        if per_row.len() % 2 == 1 {
            Ok(per_row[mid])
        } else {
            Ok((per_row[mid - 1] + per_row[mid]) / 2.0)
        }
    }

    /// Unbiased estimate of the item's count from each repetition alone.
    fn row_estimates<I: CanonicalItem + ?Sized>(&self, item: &I) -> Result<Vec<f64>, Error> {
        let bytes = item.canonical_bytes()?;
        let repetitions = self.config.repetitions();
        let scale = f64::from(repetitions) * self.debias;
        Ok((0..repetitions)
            .map(|row| {
                let location = self.config.hashes().locate(row, &bytes);
                let cell = self.matrix.get(row as usize, location.bucket);
                scale * f64::from(location.sign) * cell
            })
            .collect())
    }

    /// Serializes the sketch.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ldpsketches::oracle::OracleConfig;
    /// # use ldpsketches::pcs::PcsSketch;
    /// let config = OracleConfig::builder(1.0, 4, 64).build().unwrap();
    /// let sketch = PcsSketch::new(config.clone());
    /// let bytes = sketch.serialize();
    /// let restored = PcsSketch::deserialize(&bytes, &config).unwrap();
    /// assert_eq!(restored.as_slice(), sketch.as_slice());
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        matrix::encode(&Family::PCS, &self.config, self.num_reports, &self.matrix)
    }

    /// Deserializes a sketch produced by [`serialize`](Self::serialize) under the same config.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are truncated or not a PCS sketch, or if they were
    /// produced under a different ε, shape or hash key.
    pub fn deserialize(bytes: &[u8], config: &OracleConfig) -> Result<Self, Error> {
        let image = matrix::decode(&Family::PCS, bytes, config)?;
        Ok(Self::with_matrix(
            config.clone(),
            image.matrix,
            image.num_reports,
        ))
    }
}

impl FrequencySketch for PcsSketch {
    type Report = PcsReport;

    fn aggregate(&mut self, report: PcsReport) -> Result<(), Error> {
        ensure_repetition(report.repetition(), self.config.repetitions())?;
        if report.values().len() != self.config.width() as usize {
            return Err(Error::invalid_input("report length does not match sketch width")
                .with_context("length", report.values().len())
                .with_context("width", self.config.width()));
        }
        for value in report.values() {
            ensure_unit_sign(*value)?;
        }

        let (values, repetition) = report.into_parts();
        self.matrix.add_row(repetition as usize, &values);
        self.num_reports += 1;
        Ok(())
    }

    fn estimate<I: CanonicalItem + ?Sized>(&self, item: &I) -> Result<f64, Error> {
        let per_row = self.row_estimates(item)?;
        Ok(per_row.iter().sum::<f64>() / per_row.len() as f64)
    }

    fn merge(&mut self, other: &Self) -> Result<(), Error> {
        self.config.ensure_compatible(&other.config)?;
        self.matrix.merge(&other.matrix);
        self.num_reports += other.num_reports;
        debug!(num_reports = self.num_reports, "merged PCS sketch");
        Ok(())
    }

    fn reset(&mut self) {
        self.matrix.reset();
        self.num_reports = 0;
        debug!("reset PCS sketch");
    }

    fn num_reports(&self) -> u64 {
        self.num_reports
    }

    fn empty_clone(&self) -> Self {
        let matrix = SketchMatrix::zeros(self.matrix.rows(), self.matrix.cols());
        Self::with_matrix(self.config.clone(), matrix, 0)
    }
}
