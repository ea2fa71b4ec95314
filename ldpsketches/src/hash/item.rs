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

use std::borrow::Cow;

use crate::error::Error;

/// Items that have a stable canonical byte form.
///
/// The canonical form is what gets hashed, on the client when a report is produced and on
/// the server when an estimate is requested. Distinct in-memory representations of the same
/// logical item map to identical bytes: integers of every width use their decimal string, so
/// `7u8`, `7i64` and `"7"` are one item, and floats use their shortest round-trip decimal with
/// `-0.0` folded into `0`.
pub trait CanonicalItem {
    /// Returns the canonical bytes, or an [`InvalidInput`] error when the value has none.
    ///
    /// [`InvalidInput`]: crate::error::ErrorKind::InvalidInput
    fn canonical_bytes(&self) -> Result<Cow<'_, [u8]>, Error>;
}

impl CanonicalItem for str {
    fn canonical_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        Ok(Cow::Borrowed(self.as_bytes()))
    }
}

impl CanonicalItem for String {
    fn canonical_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        Ok(Cow::Borrowed(self.as_bytes()))
    }
}

impl CanonicalItem for [u8] {
    fn canonical_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        Ok(Cow::Borrowed(self))
    }
}

impl<const N: usize> CanonicalItem for [u8; N] {
    fn canonical_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        Ok(Cow::Borrowed(self.as_slice()))
    }
}

impl CanonicalItem for Vec<u8> {
    fn canonical_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        Ok(Cow::Borrowed(self.as_slice()))
    }
}

impl<T: CanonicalItem + ?Sized> CanonicalItem for &T {
    fn canonical_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        (**self).canonical_bytes()
    }
}

macro_rules! impl_display_item {
    ($($ty:ty),*) => {
        $(
            impl CanonicalItem for $ty {
                fn canonical_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
                    Ok(Cow::Owned(self.to_string().into_bytes()))
                }
            }
        )*
    };
}

impl_display_item!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char
);

macro_rules! impl_float_item {
    ($($ty:ty),*) => {
        $(
            impl CanonicalItem for $ty {
                fn canonical_bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
                    if self.is_nan() {
                        return Err(Error::invalid_input("NaN has no canonical form")
                            .with_context("type", stringify!($ty)));
                    }
                    let text = if *self == 0.0 {
                        "0".to_string()
                    } else {
                        self.to_string()
                    };
                    Ok(Cow::Owned(text.into_bytes()))
                }
            }
        )*
    };
}

impl_float_item!(f32, f64);
