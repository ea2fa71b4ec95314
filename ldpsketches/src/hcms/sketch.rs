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

use std::sync::Arc;

use tracing::debug;

use super::HadamardMatrix;
use super::HcmsReport;
use super::ensure_hadamard_width;
use super::ensure_shared_hadamard;
use super::hadamard::walsh_hadamard_transform;
use crate::cms::correct_collisions;
use crate::codec::family::Family;
use crate::codec::matrix;
use crate::common::SketchMatrix;
use crate::error::Error;
use crate::hash::CanonicalItem;
use crate::oracle::FrequencySketch;
use crate::oracle::OracleConfig;
use crate::oracle::ensure_repetition;
use crate::oracle::ensure_unit_sign;

/// Server-side Hadamard Count Mean Sketch.
///
/// Each cell `S[j][l]` holds the sum of the scalars reported for repetition `j` and
/// Hadamard column `l`. Queries project a repetition row onto the item's Hadamard column,
/// costing `O(k · m)` per item; [`transform`](Self::transform) precomputes every projection
/// once so later queries cost `O(k)`.
#[derive(Debug, Clone)]
pub struct HcmsSketch {
    config: OracleConfig,
    hadamard: Arc<HadamardMatrix>,
    debias: f64,
    matrix: SketchMatrix,
    num_reports: u64,
}

impl HcmsSketch {
    /// Creates an empty sketch for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if the width is not a
    /// power of two of at least 2.
    pub fn new(config: OracleConfig) -> Result<Self, Error> {
        ensure_hadamard_width(&config)?;
        let hadamard = Arc::new(HadamardMatrix::new(config.width())?);
        Self::with_hadamard(config, hadamard)
    }

    /// Creates an empty sketch that shares an existing Hadamard matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if the width is not a
    /// power of two of at least 2, or if the matrix order differs from the width.
    pub fn with_hadamard(
        config: OracleConfig,
        hadamard: Arc<HadamardMatrix>,
    ) -> Result<Self, Error> {
        ensure_shared_hadamard(&config, &hadamard)?;
        let matrix = SketchMatrix::zeros(config.repetitions() as usize, config.width() as usize);
        debug!(
            repetitions = config.repetitions(),
            width = config.width(),
            "created HCMS sketch"
        );
        Ok(Self::from_parts(config, hadamard, matrix, 0))
    }

    fn from_parts(
        config: OracleConfig,
        hadamard: Arc<HadamardMatrix>,
        matrix: SketchMatrix,
        num_reports: u64,
    ) -> Self {
        let debias = config.budget().coordinate_debias_factor();
        Self {
            config,
            hadamard,
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

    /// Returns the shared Hadamard matrix.
    pub fn hadamard(&self) -> &Arc<HadamardMatrix> {
        &self.hadamard
    }

    /// Returns the raw sketch, row-major.
    pub fn as_slice(&self) -> &[f64] {
        self.matrix.as_slice()
    }

    /// Returns a read-only snapshot with every row moved into the item domain.
    ///
    /// The snapshot gives the same estimates as this sketch at the time of the call, up to
    /// floating-point rounding, and does not see later updates.
    pub fn transform(&self) -> HcmsTransformed {
        let mut projected = self.matrix.clone();
        for row in 0..projected.rows() {
            walsh_hadamard_transform(projected.row_mut(row));
        }
        debug!(num_reports = self.num_reports, "transformed HCMS sketch");
        HcmsTransformed {
            config: self.config.clone(),
            debias: self.debias,
            projected,
            num_reports: self.num_reports,
        }
    }

    /// Serializes the sketch.
    pub fn serialize(&self) -> Vec<u8> {
        matrix::encode(&Family::HCMS, &self.config, self.num_reports, &self.matrix)
    }

    /// Deserializes a sketch produced by [`serialize`](Self::serialize) under the same config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is not valid for HCMS, if the bytes are truncated or not
    /// an HCMS sketch, or if they were produced under a different ε, shape or hash key.
    pub fn deserialize(bytes: &[u8], config: &OracleConfig) -> Result<Self, Error> {
        ensure_hadamard_width(config)?;
        let hadamard = Arc::new(HadamardMatrix::new(config.width())?);
        Self::deserialize_with_hadamard(bytes, config, hadamard)
    }

    /// Like [`deserialize`](Self::deserialize), sharing an existing Hadamard matrix instead of
    /// building a new one.
    ///
    /// # Errors
    ///
    /// Same as [`deserialize`](Self::deserialize), plus
    /// [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if the matrix order differs
    /// from the width.
    pub fn deserialize_with_hadamard(
        bytes: &[u8],
        config: &OracleConfig,
        hadamard: Arc<HadamardMatrix>,
    ) -> Result<Self, Error> {
        ensure_shared_hadamard(config, &hadamard)?;
        let image = matrix::decode(&Family::HCMS, bytes, config)?;
        Ok(Self::from_parts(
            config.clone(),
            hadamard,
            image.matrix,
            image.num_reports,
        ))
    }
}

impl FrequencySketch for HcmsSketch {
    type Report = HcmsReport;

    fn aggregate(&mut self, report: HcmsReport) -> Result<(), Error> {
        ensure_repetition(report.repetition(), self.config.repetitions())?;
        if report.column() >= self.config.width() {
            return Err(Error::invalid_input("report column out of range")
                .with_context("column", report.column())
                .with_context("width", self.config.width()));
        }
        ensure_unit_sign(report.value())?;

        let (value, repetition, column) = report.into_parts();
        self.matrix.add(repetition as usize, column as usize, value);
        self.num_reports += 1;
        Ok(())
    }

    fn estimate<I: CanonicalItem + ?Sized>(&self, item: &I) -> Result<f64, Error> {
        let bytes = item.canonical_bytes()?;
        let projection: f64 = (0..self.config.repetitions())
            .map(|rep| {
                let bucket = self.config.hashes().locate(rep, &bytes).bucket;
                self.matrix
                    .row(rep as usize)
                    .iter()
                    .enumerate()
                    .map(|(column, cell)| cell * f64::from(self.hadamard.entry(column, bucket)))
                    .sum::<f64>()
            })
            .sum();
        Ok(correct_collisions(
            self.debias * projection,
            self.num_reports,
            self.config.width(),
        ))
    }

    fn merge(&mut self, other: &Self) -> Result<(), Error> {
        self.config.ensure_compatible(&other.config)?;
        self.matrix.merge(&other.matrix);
        self.num_reports += other.num_reports;
        debug!(num_reports = self.num_reports, "merged HCMS sketch");
        Ok(())
    }

    fn reset(&mut self) {
        self.matrix.reset();
        self.num_reports = 0;
        debug!("reset HCMS sketch");
    }

    fn num_reports(&self) -> u64 {
        self.num_reports
    }

    fn empty_clone(&self) -> Self {
        let matrix = SketchMatrix::zeros(self.matrix.rows(), self.matrix.cols());
        Self::from_parts(self.config.clone(), self.hadamard.clone(), matrix, 0)
    }
}

/// An HCMS sketch with every repetition row already projected onto the Hadamard basis.
///
/// Produced by [`HcmsSketch::transform`].
#[derive(Debug, Clone)]
pub struct HcmsTransformed {
    config: OracleConfig,
    debias: f64,
    projected: SketchMatrix,
    num_reports: u64,
}

impl HcmsTransformed {
    /// Returns the configuration.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Returns the number of reports the snapshot was taken over.
    pub fn num_reports(&self) -> u64 {
        self.num_reports
    }

    /// Returns the frequency estimate of `item`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`](crate::error::ErrorKind::InvalidInput) if the item has no
    /// canonical byte form.
    pub fn estimate<I: CanonicalItem + ?Sized>(&self, item: &I) -> Result<f64, Error> {
        let bytes = item.canonical_bytes()?;
        let projection: f64 = (0..self.config.repetitions())
            .map(|rep| {
                let bucket = self.config.hashes().locate(rep, &bytes).bucket;
                self.projected.get(rep as usize, bucket)
            })
            .sum();
        Ok(correct_collisions(
            self.debias * projection,
            self.num_reports,
            self.config.width(),
        ))
    }

    /// Estimates each of `items` in order.
    pub fn estimate_many<'a, I, T>(&self, items: T) -> Result<Vec<f64>, Error>
    where
        I: CanonicalItem + ?Sized + 'a,
        T: IntoIterator<Item = &'a I>,
    {
        items.into_iter().map(|item| self.estimate(item)).collect()
    }
}
