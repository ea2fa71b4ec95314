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

//! Private Count Sketch: a frequency oracle with sign perturbation.
//!
//! A client picks one of `l` repetitions at random, hashes its item to a bucket and a sign,
//! and sends a ±1 vector of length `w` in which only the hashed bucket carries the signed
//! item. Every other coordinate is a fair coin, and the hashed coordinate is negated with
//! probability `1 / (1 + e^ε)`, which makes the report ε-locally differentially private.
//!
//! The server adds reports into an `l × w` sketch. An estimate reads the item's signed cell
//! in every repetition, scales it by `l` (each report lands in one of `l` rows) and by
//! `(e^ε + 1) / (e^ε - 1)` (the attenuation of the randomized response), and averages.
//!
//! # Usage
//!
//! ```rust
//! use ldpsketches::ClientPerturber;
//! use ldpsketches::FrequencySketch;
//! use ldpsketches::oracle::OracleConfig;
//! use ldpsketches::pcs::PcsPerturber;
//! use ldpsketches::pcs::PcsSketch;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let config = OracleConfig::builder(4.0, 16, 256).build().unwrap();
//! let perturber = PcsPerturber::new(config.clone());
//! let mut sketch = PcsSketch::new(config);
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! for _ in 0..500 {
//!     let report = perturber.privatize("apple", &mut rng).unwrap();
//!     sketch.aggregate(report).unwrap();
//! }
//!
//! let apple = sketch.estimate("apple").unwrap();
//! assert!((apple - 500.0).abs() < 150.0);
//! ```

mod perturber;
mod sketch;

pub use self::perturber::PcsPerturber;
pub use self::perturber::PcsReport;
pub use self::sketch::PcsSketch;
