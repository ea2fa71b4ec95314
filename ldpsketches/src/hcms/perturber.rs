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

use rand::Rng;
use tracing::trace;

use super::HadamardMatrix;
use super::ensure_hadamard_width;
use super::ensure_shared_hadamard;
use crate::error::Error;
use crate::hash::CanonicalItem;
use crate::oracle::ClientPerturber;
use crate::oracle::OracleConfig;

/// A privatized HCMS report: one ±1 scalar plus the repetition and Hadamard column it was
/// sampled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HcmsReport {
    value: f64,
    repetition: u32,
    column: u32,
}

impl HcmsReport {
    /// Rebuilds a report received from a client.
    pub fn new(value: f64, repetition: u32, column: u32) -> Self {
        Self {
            value,
            repetition,
            column,
        }
    }

    /// Returns the perturbed scalar.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the repetition index.
    pub fn repetition(&self) -> u32 {
        self.repetition
    }

    /// Returns the sampled Hadamard column.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Splits the report into `(value, repetition, column)`.
    pub fn into_parts(self) -> (f64, u32, u32) {
        (self.value, self.repetition, self.column)
    }
}

/// Client-side HCMS randomizer.
#[derive(Debug, Clone)]
pub struct HcmsPerturber {
    config: OracleConfig,
    hadamard: Arc<HadamardMatrix>,
    flip_probability: f64,
}

impl HcmsPerturber {
    /// Creates a perturber for `config`, building its own Hadamard matrix.
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

    /// Creates a perturber that shares an existing Hadamard matrix.
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
        let flip_probability = config.budget().coordinate_flip_probability();
        Ok(Self {
            config,
            hadamard,
            flip_probability,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Returns the shared Hadamard matrix.
    pub fn hadamard(&self) -> &Arc<HadamardMatrix> {
        &self.hadamard
    }

    /// Returns `P(b = -1) = 1 / (1 + e^(ε/2))`.
    pub fn flip_probability(&self) -> f64 {
        self.flip_probability
    }
}

impl ClientPerturber for HcmsPerturber {
    type Report = HcmsReport;

    fn privatize<I, R>(&self, item: &I, rng: &mut R) -> Result<HcmsReport, Error>
    where
        I: CanonicalItem + ?Sized,
        R: Rng + ?Sized,
    {
        let bytes = item.canonical_bytes()?;
        let repetition = rng.gen_range(0..self.config.repetitions());
        let row = self.config.hashes().locate(repetition, &bytes).bucket;
        let column = rng.gen_range(0..self.config.width());

        let weight = f64::from(self.hadamard.entry(column as usize, row));
        let value = if rng.gen_bool(self.flip_probability) {
            -weight
        } else {
            weight
        };

        trace!(repetition, column, "privatized HCMS report");
        Ok(HcmsReport {
            value,
            repetition,
            column,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use crate::error::ErrorKind;

    #[test]
    fn test_width_must_be_power_of_two() {
        let config = OracleConfig::builder(1.0, 4, 10).build().unwrap();
        let err = HcmsPerturber::new(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let config = OracleConfig::builder(1.0, 4, 16).build().unwrap();
        assert!(HcmsPerturber::new(config).is_ok());
    }

    #[test]
    fn test_shared_matrix_order_must_match() {
        let config = OracleConfig::builder(1.0, 4, 16).build().unwrap();
        let hadamard = Arc::new(HadamardMatrix::new(32).unwrap());
        let err = HcmsPerturber::with_hadamard(config, hadamard).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_reported_sign_follows_hadamard_entry() {
        let config = OracleConfig::builder(2.0, 1, 16).build().unwrap();
        let perturber = HcmsPerturber::new(config).unwrap();
        let row = perturber.config().hashes().bucket(0, "apple").unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let trials = 20_000;
        let mut flipped = 0;
        for _ in 0..trials {
            let report = perturber.privatize("apple", &mut rng).unwrap();
            assert_eq!(report.repetition(), 0);
            assert!(report.column() < 16);
            let clean = f64::from(perturber.hadamard().entry(report.column() as usize, row));
            if report.value() != clean {
                assert_eq!(report.value(), -clean);
                flipped += 1;
            }
        }
        let rate = flipped as f64 / trials as f64;
        let expected = perturber.flip_probability();
        assert!((rate - expected).abs() < 0.01, "rate {rate}, expected {expected}");
    }
}
