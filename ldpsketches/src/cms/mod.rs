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

//! Count Mean Sketch frequency oracle.
//!
//! A client picks one of `k` repetitions, hashes its item to a row index in `[0, m)` and
//! encodes it as a ±1 vector that is `+1` at that index and `-1` elsewhere. Each coordinate is
//! then negated independently with probability `p = 1 / (1 + e^(ε/2))`.
//!
//! The server sums reports into a `k × m` sketch without any scaling. An estimate debiases
//! every cell by `c = 1 / (1 - 2p)`, maps the ±1 domain back to counts, sums the item's cells
//! over all repetitions and removes the `1/m` share that every other report hashes into the
//! same cell:
//!
//! ```text
//! f(x) = m / (m - 1) * (c / 2 * Σ_j S[j][h_j(x)] + n / 2 - n / m)
//! ```
//!
//! See [`hcms`](crate::hcms) for the variant that sends a single value per report.
//!
//! # Usage
//!
//! ```rust
//! use ldpsketches::ClientPerturber;
//! use ldpsketches::FrequencySketch;
//! use ldpsketches::cms::CmsPerturber;
//! use ldpsketches::cms::CmsSketch;
//! use ldpsketches::oracle::OracleConfig;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let config = OracleConfig::builder(5.0, 50, 256).build().unwrap();
//! let perturber = CmsPerturber::new(config.clone()).unwrap();
//! let mut sketch = CmsSketch::new(config).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! for _ in 0..1000 {
//!     sketch.aggregate(perturber.privatize("apple", &mut rng).unwrap()).unwrap();
//! }
//! let apple = sketch.estimate("apple").unwrap();
//! assert!((apple - 1000.0).abs() < 100.0);
//! ```

mod perturber;
mod sketch;

pub use self::perturber::CmsPerturber;
pub use self::perturber::CmsReport;
pub use self::sketch::CmsSketch;
use crate::error::Error;
use crate::oracle::OracleConfig;

/// Count-mean estimators divide by `m - 1`.
pub(crate) fn ensure_count_mean_width(config: &OracleConfig) -> Result<(), Error> {
    if config.width() < 2 {
        return Err(
            Error::config("count mean sketches need at least 2 buckets")
                .with_context("width", config.width()),
        );
    }
    Ok(())
}

/// Turns the summed, debiased indicator mass of an item's cells into a count estimate.
///
/// `indicator_sum` estimates `f + (n - f) / m`: the item's own reports plus the expected
/// share of every other report that hashed into the same cells.
pub(crate) fn correct_collisions(indicator_sum: f64, num_reports: u64, width: u32) -> f64 {
    let m = f64::from(width);
    let n = num_reports as f64;
    m / (m - 1.0) * (indicator_sum - n / m)
}
