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

use rand::Rng;
use tracing::trace;

use crate::error::Error;
use crate::hash::CanonicalItem;
use crate::oracle::ClientPerturber;
use crate::oracle::OracleConfig;

/// A privatized PCS report: a ±1 vector and the repetition it belongs to.
#[derive(Debug, PartialEq)]
pub struct PcsReport {
    values: Vec<f64>,
    repetition: u32,
}

impl PcsReport {
    /// Rebuilds a report received from a client.
    pub fn new(values: Vec<f64>, repetition: u32) -> Self {
        Self { values, repetition }
    }

    /// Returns the perturbed vector.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the repetition index.
    pub fn repetition(&self) -> u32 {
        self.repetition
    }

    /// Splits the report into its vector and repetition index.
    pub fn into_parts(self) -> (Vec<f64>, u32) {
        (self.values, self.repetition)
    }
}

/// Client-side PCS randomizer.
///
/// Only the hashed coordinate depends on the item, so only its flip is calibrated by ε; every
/// other coordinate is an unbiased ±1 coin that reveals nothing.
#[derive(Debug, Clone)]
pub struct PcsPerturber {
    config: OracleConfig,
    flip_probability: f64,
}

impl PcsPerturber {
    /// Creates a perturber for `config`.
    pub fn new(config: OracleConfig) -> Self {
        let flip_probability = config.budget().sign_flip_probability();
        Self {
            config,
            flip_probability,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Returns the probability of negating the hashed coordinate.
    pub fn flip_probability(&self) -> f64 {
        self.flip_probability
    }
}

impl ClientPerturber for PcsPerturber {
    type Report = PcsReport;

    fn privatize<I, R>(&self, item: &I, rng: &mut R) -> Result<PcsReport, Error>
    where
        I: CanonicalItem + ?Sized,
        R: Rng + ?Sized,
    {
        let bytes = item.canonical_bytes()?;
        let repetition = rng.gen_range(0..self.config.repetitions());
        let location = self.config.hashes().locate(repetition, &bytes);

        // Coordinates off the hashed bucket carry no information: fair coins.
        let mut values: Vec<f64> = (0..self.config.width())
            .map(|_| if rng.gen_bool(0.5) { 1.0 } else { -1.0 })
            .collect();
        let mut signed = f64::from(location.sign);
        if rng.gen_bool(self.flip_probability) {
            signed = -signed;
        }
        values[location.bucket] = signed;

        trace!(repetition, "privatized PCS report");
        Ok(PcsReport { values, repetition })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn perturber(epsilon: f64) -> PcsPerturber {
        PcsPerturber::new(OracleConfig::builder(epsilon, 4, 32).build().unwrap())
    }

    #[test]
    fn test_report_shape() {
        let perturber = perturber(1.0);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let report = perturber.privatize("apple", &mut rng).unwrap();
            assert_eq!(report.values().len(), 32);
            assert!(report.repetition() < 4);
            assert!(report.values().iter().all(|v| *v == 1.0 || *v == -1.0));
        }
    }

    #[test]
    fn test_hashed_coordinate_flip_rate() {
        let perturber = perturber(1.0);
        let hashes = perturber.config().hashes().clone();
        let mut rng = StdRng::seed_from_u64(9);
        let trials = 20_000;
        let mut flipped = 0;
        for _ in 0..trials {
            let report = perturber.privatize("apple", &mut rng).unwrap();
            let rep = report.repetition();
            let bucket = hashes.bucket(rep, "apple").unwrap();
            let sign = f64::from(hashes.sign(rep, "apple").unwrap());
            if report.values()[bucket] != sign {
                flipped += 1;
            }
        }
        let expected = 1.0 / (1.0 + 1.0f64.exp());
        let rate = flipped as f64 / trials as f64;
        assert!((rate - expected).abs() < 0.015, "rate {rate}, expected {expected}");
    }

    #[test]
    fn test_other_coordinates_are_fair() {
        let perturber = perturber(8.0);
        let hashes = perturber.config().hashes().clone();
        let mut rng = StdRng::seed_from_u64(13);
        let mut total = 0.0;
        let mut count = 0.0;
        for _ in 0..2_000 {
            let report = perturber.privatize(&17u32, &mut rng).unwrap();
            let bucket = hashes.bucket(report.repetition(), &17u32).unwrap();
            for (i, value) in report.values().iter().enumerate() {
                if i != bucket {
                    total += value;
                    count += 1.0;
                }
            }
        }
        assert!((total / count).abs() < 0.02);
    }

    #[test]
    fn test_nan_item_is_rejected() {
        let perturber = perturber(1.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(perturber.privatize(&f64::NAN, &mut rng).is_err());
    }
}
