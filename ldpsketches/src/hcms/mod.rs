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

//! Hadamard Count Mean Sketch: the single-scalar variant of [`cms`](crate::cms).
//!
//! A client picks a repetition `j`, hashes its item to a row `r` in `[0, m)`, samples a
//! column `l` uniformly from `[0, m)` and sends `b · H[l][r]` together with `(j, l)`, where
//! `H` is the `m × m` Sylvester Hadamard matrix and `b` is `-1` with probability
//! `p = 1 / (1 + e^(ε/2))`. One number travels instead of `m`, which is why `m` must be a
//! power of two.
//!
//! The server adds each scalar into cell `(j, l)`. Because distinct Hadamard rows are
//! orthogonal, projecting repetition row `j` onto column `h_j(x)` recovers the reports that
//! hashed to the item's row and cancels the rest in expectation:
//!
//! ```text
//! f(x) = m / (m - 1) * (c * Σ_j Σ_l S[j][l] · H[l][h_j(x)] - n / m),  c = 1 / (1 - 2p)
//! ```
//!
//! [`HcmsSketch::transform`] computes every projection at once with a fast Walsh–Hadamard
//! transform for workloads that query many items.
//!
//! # Usage
//!
//! ```rust
//! use ldpsketches::ClientPerturber;
//! use ldpsketches::FrequencySketch;
//! use ldpsketches::hcms::HcmsPerturber;
//! use ldpsketches::hcms::HcmsSketch;
//! use ldpsketches::oracle::OracleConfig;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let config = OracleConfig::builder(5.0, 50, 256).build().unwrap();
//! let perturber = HcmsPerturber::new(config.clone()).unwrap();
//! let mut sketch = HcmsSketch::with_hadamard(config, perturber.hadamard().clone()).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! for _ in 0..1000 {
//!     sketch.aggregate(perturber.privatize("apple", &mut rng).unwrap()).unwrap();
//! }
//!
//! let transformed = sketch.transform();
//! let apple = transformed.estimate("apple").unwrap();
//! assert!((apple - 1000.0).abs() < 100.0);
//! ```

mod hadamard;
mod perturber;
mod sketch;

pub use self::hadamard::HadamardMatrix;
pub use self::perturber::HcmsPerturber;
pub use self::perturber::HcmsReport;
pub use self::sketch::HcmsSketch;
pub use self::sketch::HcmsTransformed;
use crate::error::Error;
use crate::oracle::OracleConfig;

/// HCMS widths must be powers of two, and the count-mean correction divides by `m - 1`.
pub(crate) fn ensure_hadamard_width(config: &OracleConfig) -> Result<(), Error> {
    let width = config.width();
    if width < 2 || !width.is_power_of_two() {
        return Err(
            Error::config("HCMS width must be a power of two of at least 2")
                .with_context("width", width),
        );
    }
    Ok(())
}

/// A shared matrix must match the width it is used with.
pub(crate) fn ensure_shared_hadamard(
    config: &OracleConfig,
    hadamard: &HadamardMatrix,
) -> Result<(), Error> {
    ensure_hadamard_width(config)?;
    if hadamard.order() != config.width() {
        return Err(Error::config("Hadamard order does not match sketch width")
            .with_context("order", hadamard.order())
            .with_context("width", config.width()));
    }
    Ok(())
}
