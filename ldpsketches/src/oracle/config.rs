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

use crate::common::PrivacyBudget;
use crate::error::Error;
use crate::hash::HashFamily;
use crate::hash::KeyedHash;
use crate::hash::Murmur3KeyedHash;

/// Validated parameters shared by a perturber and the sketch that receives its reports.
///
/// Cloning is cheap: the hash family is reference counted.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    budget: PrivacyBudget,
    repetitions: u32,
    hashes: HashFamily,
}

impl OracleConfig {
    /// Returns a builder for the given ε, repetition count and sketch width.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ldpsketches::oracle::OracleConfig;
    /// let config = OracleConfig::builder(2.0, 16, 1024).seed(42).build().unwrap();
    /// assert_eq!(config.repetitions(), 16);
    /// assert_eq!(config.width(), 1024);
    /// ```
    pub fn builder(epsilon: f64, repetitions: u32, width: u32) -> OracleBuilder {
        OracleBuilder::new(epsilon, repetitions, width)
    }

    /// Assembles a config from parts that are already validated on their own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if `repetitions` is
    /// zero.
    pub fn new(budget: PrivacyBudget, repetitions: u32, hashes: HashFamily) -> Result<Self, Error> {
        if repetitions == 0 {
            return Err(Error::config("repetitions must be at least 1"));
        }
        Ok(Self {
            budget,
            repetitions,
            hashes,
        })
    }

    /// Returns the privacy budget.
    pub fn budget(&self) -> PrivacyBudget {
        self.budget
    }

    /// Returns ε.
    pub fn epsilon(&self) -> f64 {
        self.budget.epsilon()
    }

    /// Returns the number of hash repetitions (sketch rows).
    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// Returns the number of buckets per repetition (sketch columns).
    pub fn width(&self) -> u32 {
        self.hashes.width()
    }

    /// Returns the hash family.
    pub fn hashes(&self) -> &HashFamily {
        &self.hashes
    }

    /// Whether reports produced under `self` can be combined with ones produced under `other`.
    pub fn is_compatible(&self, other: &OracleConfig) -> bool {
        self.epsilon().to_bits() == other.epsilon().to_bits()
            && self.repetitions == other.repetitions
            && self.hashes.is_compatible(&other.hashes)
    }

    pub(crate) fn ensure_compatible(&self, other: &OracleConfig) -> Result<(), Error> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(Error::incompatible("sketches were built with different configurations")
                .with_context("epsilon", format!("{} vs {}", self.epsilon(), other.epsilon()))
                .with_context(
                    "repetitions",
                    format!("{} vs {}", self.repetitions, other.repetitions),
                )
                .with_context("width", format!("{} vs {}", self.width(), other.width())))
        }
    }
}

/// Builder for [`OracleConfig`].
///
/// Hashing defaults to [`Murmur3KeyedHash`] with the default seed.
#[derive(Debug, Clone)]
pub struct OracleBuilder {
    epsilon: f64,
    repetitions: u32,
    width: u32,
    hasher: Arc<dyn KeyedHash>,
}

impl OracleBuilder {
    /// Creates a builder. Nothing is validated until [`build`](Self::build).
    pub fn new(epsilon: f64, repetitions: u32, width: u32) -> Self {
        Self {
            epsilon,
            repetitions,
            width,
            hasher: Arc::new(Murmur3KeyedHash::default()),
        }
    }

    /// Uses the murmur hash family with a custom seed (default: 9001).
    ///
    /// **Important**: clients and server must use the same seed.
    pub fn seed(mut self, seed: u32) -> Self {
        self.hasher = Arc::new(Murmur3KeyedHash::with_seed(seed));
        self
    }

    /// Uses the murmur hash family keyed by `seed` and secret `key` bytes.
    pub fn keyed(mut self, seed: u32, key: impl Into<Vec<u8>>) -> Self {
        self.hasher = Arc::new(Murmur3KeyedHash::with_key(seed, key));
        self
    }

    /// Uses a caller-provided keyed hash.
    pub fn hasher(mut self, hasher: impl KeyedHash + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// Validates the parameters and builds the config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if ε is not a positive
    /// finite number, if `repetitions` or `width` is zero, or if the hash output is too short
    /// for `width`.
    pub fn build(self) -> Result<OracleConfig, Error> {
        let budget = PrivacyBudget::new(self.epsilon)?;
        let hashes = HashFamily::from_shared(self.hasher, self.width)?;
        let config = OracleConfig::new(budget, self.repetitions, hashes)?;
        debug!(
            epsilon = config.epsilon(),
            repetitions = config.repetitions(),
            width = config.width(),
            "built oracle config"
        );
        Ok(config)
    }
}
