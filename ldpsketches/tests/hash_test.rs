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

use ldpsketches::hash::HashFamily;
use ldpsketches::hash::Murmur3KeyedHash;

fn family(seed: u32, width: u32) -> HashFamily {
    HashFamily::new(Murmur3KeyedHash::with_seed(seed), width).unwrap()
}

#[test]
fn test_independent_families_agree() {
    let client = family(77, 1024);
    let server = family(77, 1024);
    for repetition in 0..32 {
        for item in ["apple", "banana", "", "ünïcödé", "a much longer item than the others"] {
            assert_eq!(
                client.bucket(repetition, item).unwrap(),
                server.bucket(repetition, item).unwrap()
            );
            assert_eq!(
                client.sign(repetition, item).unwrap(),
                server.sign(repetition, item).unwrap()
            );
        }
    }
    assert!(client.is_compatible(&server));
}

#[test]
fn test_repeated_calls_are_stable() {
    let hashes = family(1, 97);
    let first: Vec<_> = (0..64).map(|r| hashes.bucket(r, "apple").unwrap()).collect();
    let second: Vec<_> = (0..64).map(|r| hashes.bucket(r, "apple").unwrap()).collect();
    assert_eq!(first, second);
    assert!(first.iter().all(|bucket| *bucket < 97));
}

#[test]
fn test_repetitions_are_independent_functions() {
    let hashes = family(1, 1 << 16);
    let buckets: Vec<_> = (0..16).map(|r| hashes.bucket(r, "apple").unwrap()).collect();
    let distinct = buckets
        .iter()
        .collect::<std::collections::HashSet<_>>()
        .len();
    assert!(distinct > 12, "{buckets:?}");
}

#[test]
fn test_buckets_and_signs_are_balanced() {
    let hashes = family(3, 8);
    let mut counts = [0_u32; 8];
    let mut positive = 0;
    let items = 8_000;
    for i in 0..items {
        let item = format!("item-{i}");
        counts[hashes.bucket(0, &item).unwrap()] += 1;
        if hashes.sign(0, &item).unwrap() == 1 {
            positive += 1;
        }
    }
    for count in counts {
        assert!((800..1_200).contains(&count), "{counts:?}");
    }
    assert!((3_700..4_300).contains(&positive), "{positive}");
}

#[test]
fn test_key_material_changes_the_mapping() {
    let plain = HashFamily::new(Murmur3KeyedHash::with_seed(5), 1 << 20).unwrap();
    let keyed =
        HashFamily::new(Murmur3KeyedHash::with_key(5, b"secret".to_vec()), 1 << 20).unwrap();
    assert!(!plain.is_compatible(&keyed));

    let differs =
        (0..8).any(|r| plain.bucket(r, "apple").unwrap() != keyed.bucket(r, "apple").unwrap());
    assert!(differs);
}

#[test]
fn test_key_is_not_printed() {
    let hasher = Murmur3KeyedHash::with_key(5, b"secret".to_vec());
    let printed = format!("{hasher:?}");
    assert!(!printed.contains("secret"));
    assert!(!printed.contains("115"));
}
