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

use super::ensure_count_mean_width;
use crate::error::Error;
use crate::hash::CanonicalItem;
use crate::oracle::ClientPerturber;
use crate::oracle::OracleConfig;

/// A privatized CMS report: a ±1 vector of length `m` and its repetition.
#[derive(Debug, PartialEq)]
pub struct CmsReport {
    values: Vec<f64>,
    repetition: u32,
}

impl CmsReport {
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

/// Client-side CMS randomizer.
#[derive(Debug, Clone)]
pub struct CmsPerturber {
    config: OracleConfig,
    flip_probability: f64,
}

impl CmsPerturber {
    /// Creates a perturber for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if the width is
    /// below 2.
    pub fn new(config: OracleConfig) -> Result<Self, Error> {
        ensure_count_mean_width(&config)?;
        let flip_probability = config.budget().coordinate_flip_probability();
        Ok(Self {
            config,
            flip_probability,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Returns the per-coordinate flip probability `1 / (1 + e^(ε/2))`.
    pub fn flip_probability(&self) -> f64 {
        self.flip_probability
    }
}

impl ClientPerturber for CmsPerturber {
    type Report = CmsReport;

    fn privatize<I, R>(&self, item: &I, rng: &mut R) -> Result<CmsReport, Error>
    where
        I: CanonicalItem + ?Sized,
        R: Rng + ?Sized,
    {
        let bytes = item.canonical_bytes()?;
        let repetition = rng.gen_range(0..self.config.repetitions());
        let row = self.config.hashes().locate(repetition, &bytes).bucket;

        let values = (0..self.config.width() as usize)
            .map(|i| {
                let value = if i == row { 1.0 } else { -1.0 };
                if rng.gen_bool(self.flip_probability) {
                    -value
                } else {
                    value
                }
            })
            .collect();

        trace!(repetition, "privatized CMS report");
        Ok(CmsReport { values, repetition })
    }
}
