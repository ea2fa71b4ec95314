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

//! The two halves of a frequency oracle and the machinery shared between them.
//!
//! A [`ClientPerturber`] turns one raw item into one privatized report on the client. A
//! [`FrequencySketch`] absorbs reports on the server and answers frequency queries. Both are
//! built from the same [`OracleConfig`], which is how client and server agree on ε, the
//! repetition count and the hash family.
//!
//! Aggregation is plain addition, so it is associative and commutative: the order in which
//! reports arrive never changes the final sketch. Two ways of aggregating from many threads
//! are provided, [`SharedSketch`] (one owner behind a lock) and [`aggregate_parallel`]
//! (per-worker partitions summed with [`FrequencySketch::merge`]).

mod config;
mod parallel;
mod shared;

use rand::Rng;

pub use self::config::OracleBuilder;
pub use self::config::OracleConfig;
pub use self::parallel::aggregate_parallel;
pub use self::shared::SharedSketch;
use crate::error::Error;
use crate::hash::CanonicalItem;

/// Client side of a frequency oracle.
///
/// Perturbers hold no mutable state; all randomness comes from the generator passed to each
/// call, so one perturber can serve any number of threads. Clients should pass a
/// cryptographically secure generator such as [`rand::thread_rng`]: anyone who can replay the
/// generator can strip the noise from a report.
pub trait ClientPerturber {
    /// The privatized value sent to the server.
    type Report;

    /// Privatizes one item.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`](crate::error::ErrorKind::InvalidInput) if the item has no
    /// canonical byte form.
    fn privatize<I, R>(&self, item: &I, rng: &mut R) -> Result<Self::Report, Error>
    where
        I: CanonicalItem + ?Sized,
        R: Rng + ?Sized;
}

/// Server side of a frequency oracle.
pub trait FrequencySketch {
    /// The report type this sketch absorbs.
    type Report;

    /// Adds one report into the sketch.
    ///
    /// The report is checked before anything is written; a rejected report leaves the sketch
    /// unchanged.
    fn aggregate(&mut self, report: Self::Report) -> Result<(), Error>;

    /// Returns the unbiased frequency estimate of `item`.
    ///
    /// Estimates are noisy and may be negative; callers decide whether to clamp them. Calling
    /// this twice without an intervening update returns the same value.
    fn estimate<I: CanonicalItem + ?Sized>(&self, item: &I) -> Result<f64, Error>;

    /// Adds every cell and report of `other` into `self`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleSketch`](crate::error::ErrorKind::IncompatibleSketch) if the two
    /// sketches were configured differently.
    fn merge(&mut self, other: &Self) -> Result<(), Error>
    where
        Self: Sized;

    /// Clears all aggregated reports, keeping the configuration.
    fn reset(&mut self);

    /// Returns the number of reports aggregated so far.
    fn num_reports(&self) -> u64;

    /// Returns an empty sketch with the same configuration.
    fn empty_clone(&self) -> Self
    where
        Self: Sized;

    /// Returns whether no report has been aggregated.
    fn is_empty(&self) -> bool {
        self.num_reports() == 0
    }

    /// Estimates each of `items` in order.
    fn estimate_many<'a, I, T>(&self, items: T) -> Result<Vec<f64>, Error>
    where
        I: CanonicalItem + ?Sized + 'a,
        T: IntoIterator<Item = &'a I>,
    {
        items.into_iter().map(|item| self.estimate(item)).collect()
    }
}

/// Checks that a ±1 report value is exactly `-1.0` or `+1.0`.
pub(crate) fn ensure_unit_sign(value: f64) -> Result<(), Error> {
    if value == 1.0 || value == -1.0 {
        Ok(())
    } else {
        Err(Error::invalid_input("report values must be -1 or +1").with_context("value", value))
    }
}

/// Checks that a report targets an existing repetition.
pub(crate) fn ensure_repetition(repetition: u32, repetitions: u32) -> Result<(), Error> {
    if repetition < repetitions {
        Ok(())
    } else {
        Err(Error::invalid_input("report repetition out of range")
            .with_context("repetition", repetition)
            .with_context("repetitions", repetitions))
    }
}
