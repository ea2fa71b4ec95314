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

use super::CmsReport;
use super::correct_collisions;
use super::ensure_count_mean_width;
use crate::codec::family::Family;
use crate::codec::matrix;
use crate::common::SketchMatrix;
use crate::error::Error;
use crate::hash::CanonicalItem;
use crate::oracle::FrequencySketch;
use crate::oracle::OracleConfig;
use crate::oracle::ensure_repetition;
use crate::oracle::ensure_unit_sign;

/// Server-side Count Mean Sketch.
#[derive(Debug, Clone)]
pub struct CmsSketch {
    config: OracleConfig,
    /// `1 / (1 - 2p)` with `p = 1 / (1 + e^(ε/2))`
    debias: f64,
    matrix: SketchMatrix,
    num_reports: u64,
}

impl CmsSketch {
    /// Creates an empty sketch for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if the width is
    /// below 2.
    pub fn new(config: OracleConfig) -> Result<Self, Error> {
        ensure_count_mean_width(&config)?;
        let matrix = SketchMatrix::zeros(config.repetitions() as usize, config.width() as usize);
        debug!(
            repetitions = config.repetitions(),
            width = config.width(),
            "created CMS sketch"
        );
        Ok(Self::with_matrix(config, matrix, 0))
    }

    fn with_matrix(config: OracleConfig, matrix: SketchMatrix, num_reports: u64) -> Self {
        let debias = config.budget().coordinate_debias_factor();
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

    /// Returns the number of repetitions `k`.
    pub fn num_repetitions(&self) -> u32 {
        self.config.repetitions()
    }

    /// Returns the width `m`.
    pub fn width(&self) -> u32 {
        self.config.width()
    }

    /// Returns the raw sketch, row-major.
    pub fn as_slice(&self) -> &[f64] {
        self.matrix.as_slice()
    }

    /// Serializes the sketch.
    pub fn serialize(&self) -> Vec<u8> {
        matrix::encode(&Family::CMS, &self.config, self.num_reports, &self.matrix)
    }

    /// Deserializes a sketch produced by [`serialize`](Self::serialize) under the same config.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are truncated or not a CMS sketch, or if they were
    /// produced under a different ε, shape or hash key.
    pub fn deserialize(bytes: &[u8], config: &OracleConfig) -> Result<Self, Error> {
        ensure_count_mean_width(config)?;
        let image = matrix::decode(&Family::CMS, bytes, config)?;
        Ok(Self::with_matrix(
            config.clone(),
            image.matrix,
            image.num_reports,
        ))
    }
}

impl FrequencySketch for CmsSketch {
    type Report = CmsReport;

    fn aggregate(&mut self, report: CmsReport) -> Result<(), Error> {
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
        let bytes = item.canonical_bytes()?;
        let cell_sum: f64 = (0..self.config.repetitions())
            .map(|row| {
                let bucket = self.config.hashes().locate(row, &bytes).bucket;
                self.matrix.get(row as usize, bucket)
            })
            .sum();
        // Debiased ±1 cells mapped back to {0, 1} indicators.
        let indicator_sum = self.debias / 2.0 * cell_sum + self.num_reports as f64 / 2.0;
        Ok(correct_collisions(
            indicator_sum,
            self.num_reports,
            self.config.width(),
        ))
    }

    fn merge(&mut self, other: &Self) -> Result<(), Error> {
        self.config.ensure_compatible(&other.config)?;
        self.matrix.merge(&other.matrix);
        self.num_reports += other.num_reports;
        debug!(num_reports = self.num_reports, "merged CMS sketch");
        Ok(())
    }

    fn reset(&mut self) {
        self.matrix.reset();
        self.num_reports = 0;
        debug!("reset CMS sketch");
    }

    fn num_reports(&self) -> u64 {
        self.num_reports
    }

    fn empty_clone(&self) -> Self {
        let matrix = SketchMatrix::zeros(self.matrix.rows(), self.matrix.cols());
        Self::with_matrix(self.config.clone(), matrix, 0)
    }
}
