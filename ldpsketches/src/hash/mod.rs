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

//! Keyed hashing from `(repetition, item)` to sketch buckets and signs.
//!
//! A [`HashFamily`] is the single value both sides of an oracle must agree on: clients use it
//! to choose the coordinate they perturb and the server uses it to find the cells an item
//! contributed to. Two families with the same [`KeyedHash`] key material and width return the
//! same bucket and sign for every input, across processes.
//!
//! # Usage
//!
//! ```rust
//! use ldpsketches::hash::HashFamily;
//! use ldpsketches::hash::Murmur3KeyedHash;
//!
//! let hashes = HashFamily::new(Murmur3KeyedHash::with_seed(7), 1024).unwrap();
//! let bucket = hashes.bucket(3, "apple").unwrap();
//! assert!(bucket < 1024);
//! assert_eq!(bucket, hashes.bucket(3, "apple").unwrap());
//! ```

mod item;

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

pub use self::item::CanonicalItem;
use crate::error::Error;

/// Default seed of the murmur hash family.
pub const DEFAULT_SEED: u32 = 9001;

/// A deterministic keyed hash over `(repetition, item_bytes)`.
///
/// Implementations must return the same digest for the same input whenever they hold the same
/// key material, and only the low [`output_bits`](Self::output_bits) bits of a digest may be
/// set.
pub trait KeyedHash: fmt::Debug + Send + Sync {
    /// Number of meaningful low bits in every digest.
    fn output_bits(&self) -> u32;

    /// Hashes one item for one repetition.
    fn digest(&self, repetition: u32, item: &[u8]) -> u128;

    /// Short identifier of the key material, stored with serialized sketches.
    fn fingerprint(&self) -> u16;
}

/// MurmurHash3 x64/128 keyed by a seed and optional key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Murmur3KeyedHash {
    seed: u32,
    key: Vec<u8>,
}

impl Murmur3KeyedHash {
    /// Creates a hash keyed only by `seed`.
    pub fn with_seed(seed: u32) -> Self {
        Self { seed, key: vec![] }
    }

    /// Creates a hash keyed by `seed` and secret `key` bytes.
    pub fn with_key(seed: u32, key: impl Into<Vec<u8>>) -> Self {
        Self {
            seed,
            key: key.into(),
        }
    }

    /// Returns the seed.
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for Murmur3KeyedHash {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

// Key bytes stay out of logs.
impl fmt::Debug for Murmur3KeyedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Murmur3KeyedHash")
            .field("seed", &self.seed)
            .field("key_len", &self.key.len())
            .finish()
    }
}

impl KeyedHash for Murmur3KeyedHash {
    fn output_bits(&self) -> u32 {
        128
    }

    fn digest(&self, repetition: u32, item: &[u8]) -> u128 {
        let mut hasher = mur3::Hasher128::with_seed(self.seed);
        hasher.write(&self.key);
        hasher.write(&repetition.to_le_bytes());
        hasher.write(item);
        let (h1, h2) = hasher.finish128();
        (u128::from(h2) << 64) | u128::from(h1)
    }

    fn fingerprint(&self) -> u16 {
        let mut hasher = mur3::Hasher128::with_seed(0);
        hasher.write(&self.seed.to_le_bytes());
        hasher.write(&self.key);
        let (h1, _) = hasher.finish128();
        (h1 & 0xffff) as u16
    }
}

/// Where an item lands in one repetition of a sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Location {
    pub bucket: usize,
    pub sign: i8,
}

/// A keyed hash bound to a sketch width.
///
/// The low bit of the digest is the sign (`0 -> -1`, `1 -> +1`) and the remaining bits, reduced
/// modulo the width, are the bucket.
#[derive(Debug, Clone)]
pub struct HashFamily {
    hasher: Arc<dyn KeyedHash>,
    width: u32,
}

impl HashFamily {
    /// Binds `hasher` to `width` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if `width` is zero or
    /// the hasher emits fewer than [`required_bits(width)`](Self::required_bits) bits.
    pub fn new(hasher: impl KeyedHash + 'static, width: u32) -> Result<Self, Error> {
        Self::from_shared(Arc::new(hasher), width)
    }

    /// Like [`new`](Self::new), for a hasher that is already shared.
    pub fn from_shared(hasher: Arc<dyn KeyedHash>, width: u32) -> Result<Self, Error> {
        if width == 0 {
            return Err(Error::config("width must be at least 1"));
        }
        let required = Self::required_bits(width);
        if hasher.output_bits() < required {
            return Err(Error::config("hash output is too short for the sketch width")
                .with_context("width", width)
                .with_context("required_bits", required)
                .with_context("output_bits", hasher.output_bits()));
        }
        Ok(Self { hasher, width })
    }

    /// Digest bits needed for `width` buckets: `ceil(log2(width))` for the index plus one sign bit.
    pub fn required_bits(width: u32) -> u32 {
        let index_bits = if width <= 1 {
            0
        } else {
            u32::BITS - (width - 1).leading_zeros()
        };
        index_bits + 1
    }

    /// Returns the number of buckets per repetition.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the fingerprint of the key material.
    pub fn fingerprint(&self) -> u16 {
        self.hasher.fingerprint()
    }

    /// Returns the bucket of `item` in `repetition`, in `[0, width)`.
    pub fn bucket<I: CanonicalItem + ?Sized>(
        &self,
        repetition: u32,
        item: &I,
    ) -> Result<usize, Error> {
        let bytes = item.canonical_bytes()?;
        Ok(self.locate(repetition, &bytes).bucket)
    }

    /// Returns the sign of `item` in `repetition`, `-1` or `+1`.
    pub fn sign<I: CanonicalItem + ?Sized>(&self, repetition: u32, item: &I) -> Result<i8, Error> {
        let bytes = item.canonical_bytes()?;
        Ok(self.locate(repetition, &bytes).sign)
    }

    /// Whether `other` maps every item exactly as `self` does, as far as can be checked.
    pub fn is_compatible(&self, other: &HashFamily) -> bool {
        self.width == other.width && self.fingerprint() == other.fingerprint()
    }

    pub(crate) fn locate(&self, repetition: u32, bytes: &[u8]) -> Location {
        let digest = self.hasher.digest(repetition, bytes);
        let sign = if digest & 1 == 1 { 1 } else { -1 };
        let bucket = ((digest >> 1) % u128::from(self.width)) as usize;
        Location { bucket, sign }
    }
}
