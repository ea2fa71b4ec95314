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

use rayon::prelude::*;
use tracing::debug;

use super::FrequencySketch;
use crate::error::Error;

/// Aggregates a batch of reports on the rayon thread pool.
///
/// Each worker folds its share of `reports` into a private empty copy of `sketch`; the
/// partitions are then summed and the total merged into `sketch`. Because aggregation is
/// addition, the result equals aggregating the reports one by one in any order (up to
/// floating point rounding of the partial sums).
///
/// The batch is all or nothing: if any report is rejected, `sketch` is left unchanged and the
/// first error found is returned.
///
/// # Examples
///
/// ```
/// use ldpsketches::ClientPerturber;
/// use ldpsketches::FrequencySketch;
/// use ldpsketches::cms::CmsPerturber;
/// use ldpsketches::cms::CmsSketch;
/// use ldpsketches::oracle::OracleConfig;
/// use ldpsketches::oracle::aggregate_parallel;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let config = OracleConfig::builder(4.0, 8, 64).build().unwrap();
/// let perturber = CmsPerturber::new(config.clone()).unwrap();
/// let mut rng = StdRng::seed_from_u64(1);
/// let reports = (0..100)
///     .map(|_| perturber.privatize("apple", &mut rng))
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
///
/// let mut sketch = CmsSketch::new(config).unwrap();
/// aggregate_parallel(&mut sketch, reports).unwrap();
/// assert_eq!(sketch.num_reports(), 100);
/// ```
pub fn aggregate_parallel<S>(sketch: &mut S, reports: Vec<S::Report>) -> Result<(), Error>
where
    S: FrequencySketch + Send + Sync,
    S::Report: Send,
{
    let num_reports = reports.len();
    let template = sketch.empty_clone();
    let partial = reports
        .into_par_iter()
        .try_fold(
            || template.empty_clone(),
            |mut partition, report| {
                partition.aggregate(report)?;
                Ok::<S, Error>(partition)
            },
        )
        .try_reduce(
            || template.empty_clone(),
            |mut left, right| {
                left.merge(&right)?;
                Ok(left)
            },
        )?;
    sketch.merge(&partial)?;
    debug!(num_reports, "aggregated report batch in parallel");
    Ok(())
}
