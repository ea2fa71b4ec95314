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

use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use super::FrequencySketch;
use crate::error::Error;
use crate::hash::CanonicalItem;

/// A sketch that many threads can aggregate into and estimate from.
///
/// Every report is applied under the write lock, so an estimate never observes a partially
/// added report vector. An estimate taken while writers are active sees the sketch as of some
/// point during the collection: it may miss the latest few reports. That is the expected
/// eventual consistency of a collecting oracle, not an error; take estimates after the
/// collection epoch closes when an exact snapshot matters.
#[derive(Debug, Default)]
pub struct SharedSketch<S> {
    inner: RwLock<S>,
}

impl<S: FrequencySketch> SharedSketch<S> {
    /// Wraps `sketch`.
    pub fn new(sketch: S) -> Self {
        Self {
            inner: RwLock::new(sketch),
        }
    }

    /// Adds one report.
    pub fn aggregate(&self, report: S::Report) -> Result<(), Error> {
        self.write().aggregate(report)
    }

    /// Estimates the frequency of `item` against the current state.
    pub fn estimate<I: CanonicalItem + ?Sized>(&self, item: &I) -> Result<f64, Error> {
        self.read().estimate(item)
    }

    /// Merges a separately aggregated partition.
    pub fn merge(&self, other: &S) -> Result<(), Error> {
        self.write().merge(other)
    }

    /// Returns the number of reports aggregated so far.
    pub fn num_reports(&self) -> u64 {
        self.read().num_reports()
    }

    /// Clears the sketch for a new collection epoch.
    pub fn reset(&self) {
        self.write().reset()
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.read().clone()
    }

    /// Unwraps the sketch.
    pub fn into_inner(self) -> S {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    // Reports are validated before any cell is written, so a panicking holder cannot leave a
    // half-applied report behind; a poisoned lock still guards a consistent sketch.
    fn read(&self) -> RwLockReadGuard<'_, S> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, S> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
