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

#![allow(dead_code)]

use ldpsketches::ClientPerturber;
use ldpsketches::FrequencySketch;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Privatizes `count` copies of each item and aggregates them into `sketch`.
pub fn collect<P, S>(perturber: &P, sketch: &mut S, population: &[(&str, usize)], seed: u64)
where
    P: ClientPerturber,
    S: FrequencySketch<Report = P::Report>,
{
    let mut rng = StdRng::seed_from_u64(seed);
    for (item, count) in population {
        for _ in 0..*count {
            let report = perturber.privatize(*item, &mut rng).unwrap();
            sketch.aggregate(report).unwrap();
        }
    }
}

/// Privatizes `count` copies of each item without aggregating them.
pub fn privatize_all<P: ClientPerturber>(
    perturber: &P,
    population: &[(&str, usize)],
    seed: u64,
) -> Vec<P::Report> {
    let mut rng = StdRng::seed_from_u64(seed);
    population
        .iter()
        .flat_map(|(item, count)| std::iter::repeat_n(*item, *count))
        .map(|item| perturber.privatize(item, &mut rng).unwrap())
        .collect()
}
