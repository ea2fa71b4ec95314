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

mod common;

use common::collect;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use ldpsketches::FrequencySketch;
use ldpsketches::cms::CmsPerturber;
use ldpsketches::cms::CmsSketch;
use ldpsketches::error::ErrorKind;
use ldpsketches::hcms::HcmsPerturber;
use ldpsketches::hcms::HcmsSketch;
use ldpsketches::oracle::OracleConfig;
use ldpsketches::pcs::PcsPerturber;
use ldpsketches::pcs::PcsSketch;

const PREAMBLE_BYTES: usize = 32;
const POPULATION: &[(&str, usize)] = &[("apple", 300), ("banana", 120), ("cherry", 30)];

fn config(seed: u32) -> OracleConfig {
    OracleConfig::builder(2.0, 8, 64).seed(seed).build().unwrap()
}

#[test]
fn test_empty_sketch_is_preamble_only() {
    let cms = CmsSketch::new(config(1)).unwrap();
    let bytes = cms.serialize();
    assert_eq!(bytes.len(), PREAMBLE_BYTES);

    let restored = CmsSketch::deserialize(&bytes, &config(1)).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.serialize(), bytes);
}

#[test]
fn test_pcs_round_trip() {
    let perturber = PcsPerturber::new(config(1));
    let mut sketch = PcsSketch::new(config(1));
    collect(&perturber, &mut sketch, POPULATION, 5);

    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), PREAMBLE_BYTES + 8 * 64 * 8);
    let restored = PcsSketch::deserialize(&bytes, &config(1)).unwrap();
    assert_eq!(restored.num_reports(), 450);
    assert_eq!(restored.as_slice(), sketch.as_slice());
    assert_eq!(restored.serialize(), bytes);
    for (item, _) in POPULATION {
        assert_eq!(
            restored.estimate(*item).unwrap().to_bits(),
            sketch.estimate(*item).unwrap().to_bits()
        );
    }
}

#[test]
fn test_cms_round_trip() {
    let perturber = CmsPerturber::new(config(1)).unwrap();
    let mut sketch = CmsSketch::new(config(1)).unwrap();
    collect(&perturber, &mut sketch, POPULATION, 6);

    let bytes = sketch.serialize();
    let restored = CmsSketch::deserialize(&bytes, &config(1)).unwrap();
    assert_eq!(restored.as_slice(), sketch.as_slice());
    assert_eq!(
        restored.estimate("apple").unwrap().to_bits(),
        sketch.estimate("apple").unwrap().to_bits()
    );
}

#[test]
fn test_hcms_round_trip() {
    let perturber = HcmsPerturber::new(config(1)).unwrap();
    let mut sketch = HcmsSketch::new(config(1)).unwrap();
    collect(&perturber, &mut sketch, POPULATION, 7);

    let bytes = sketch.serialize();
    let restored = HcmsSketch::deserialize(&bytes, &config(1)).unwrap();
    assert_eq!(restored.num_reports(), sketch.num_reports());
    assert_eq!(restored.as_slice(), sketch.as_slice());
    assert_eq!(
        restored.estimate("banana").unwrap().to_bits(),
        sketch.estimate("banana").unwrap().to_bits()
    );
}

#[test]
fn test_restored_sketch_keeps_collecting() {
    let perturber = CmsPerturber::new(config(1)).unwrap();
    let mut whole = CmsSketch::new(config(1)).unwrap();
    collect(&perturber, &mut whole, POPULATION, 9);

    let mut first = CmsSketch::new(config(1)).unwrap();
    collect(&perturber, &mut first, &POPULATION[..1], 9);
    let mut restored = CmsSketch::deserialize(&first.serialize(), &config(1)).unwrap();
    let mut rest = CmsSketch::new(config(1)).unwrap();
    collect(&perturber, &mut rest, &POPULATION[1..], 10);
    restored.merge(&rest).unwrap();

    assert_eq!(restored.num_reports(), whole.num_reports());
}

#[test]
fn test_wrong_seed_is_rejected() {
    let perturber = CmsPerturber::new(config(9001)).unwrap();
    let mut sketch = CmsSketch::new(config(9001)).unwrap();
    collect(&perturber, &mut sketch, POPULATION, 1);

    let err = CmsSketch::deserialize(&sketch.serialize(), &config(9000)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompatibleSketch);
    assert_that!(err.message(), contains_substring("incompatible hash fingerprint"));
}

#[test]
fn test_wrong_shape_is_rejected() {
    let sketch = PcsSketch::new(config(1));
    let other = OracleConfig::builder(2.0, 8, 128).seed(1).build().unwrap();
    let err = PcsSketch::deserialize(&sketch.serialize(), &other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompatibleSketch);

    let other = OracleConfig::builder(3.0, 8, 64).seed(1).build().unwrap();
    let err = PcsSketch::deserialize(&sketch.serialize(), &other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncompatibleSketch);
}

#[test]
fn test_wrong_family_is_rejected() {
    let cms = CmsSketch::new(config(1)).unwrap();
    let err = HcmsSketch::deserialize(&cms.serialize(), &config(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
    assert_that!(err.message(), contains_substring("invalid family"));
}

#[test]
fn test_truncated_and_padded_bytes_are_rejected() {
    let perturber = PcsPerturber::new(config(1));
    let mut sketch = PcsSketch::new(config(1));
    collect(&perturber, &mut sketch, POPULATION, 2);
    let bytes = sketch.serialize();

    for len in [0, 3, PREAMBLE_BYTES - 1, PREAMBLE_BYTES, bytes.len() - 1] {
        let err = PcsSketch::deserialize(&bytes[..len], &config(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData, "len {len}");
    }

    let mut padded = bytes.clone();
    padded.push(0);
    let err = PcsSketch::deserialize(&padded, &config(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
}
