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

//! Byte-level encoding helpers shared by the sketch serializers.

pub(crate) mod assert;
pub(crate) mod family;
pub(crate) mod matrix;

use std::io;
use std::io::Cursor;

use byteorder::ByteOrder;
use byteorder::LittleEndian;
use byteorder::ReadBytesExt;

pub(crate) struct SketchBytes {
    bytes: Vec<u8>,
}

impl SketchBytes {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write(&mut self, buf: &[u8]) {
        self.bytes.extend_from_slice(buf);
    }

    pub fn write_u8(&mut self, n: u8) {
        self.bytes.push(n);
    }

    pub fn write_u16_le(&mut self, n: u16) {
        self.write(&n.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, n: u32) {
        self.write(&n.to_le_bytes());
    }

    pub fn write_u64_le(&mut self, n: u64) {
        self.write(&n.to_le_bytes());
    }

    pub fn write_f64_le(&mut self, n: f64) {
        self.write(&n.to_le_bytes());
    }

    /// Appends `values` as consecutive little-endian doubles.
    pub fn write_f64_slice_le(&mut self, values: &[f64]) {
        let start = self.bytes.len();
        self.bytes.resize(start + values.len() * 8, 0);
        LittleEndian::write_f64_into(values, &mut self.bytes[start..]);
    }
}

pub(crate) struct SketchSlice<'a> {
    slice: Cursor<&'a [u8]>,
}

impl<'a> SketchSlice<'a> {
    pub fn new(slice: &'a [u8]) -> SketchSlice<'a> {
        SketchSlice {
            slice: Cursor::new(slice),
        }
    }

    /// Number of bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        let len = self.slice.get_ref().len() as u64;
        len.saturating_sub(self.slice.position()) as usize
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        self.slice.read_u8()
    }

    pub fn read_u16_le(&mut self) -> io::Result<u16> {
        self.slice.read_u16::<LittleEndian>()
    }

    pub fn read_u32_le(&mut self) -> io::Result<u32> {
        self.slice.read_u32::<LittleEndian>()
    }

    pub fn read_u64_le(&mut self) -> io::Result<u64> {
        self.slice.read_u64::<LittleEndian>()
    }

    pub fn read_f64_le(&mut self) -> io::Result<f64> {
        self.slice.read_f64::<LittleEndian>()
    }

    /// Fills `dst` with consecutive little-endian doubles.
    pub fn read_f64_slice_le(&mut self, dst: &mut [f64]) -> io::Result<()> {
        self.slice.read_f64_into::<LittleEndian>(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f64_slice_is_little_endian() {
        let mut bytes = SketchBytes::with_capacity(16);
        bytes.write_f64_slice_le(&[1.0, -2.5]);
        let bytes = bytes.into_bytes();
        assert_eq!(&bytes[..8], &1.0f64.to_le_bytes());
        assert_eq!(&bytes[8..], &(-2.5f64).to_le_bytes());

        let mut slice = SketchSlice::new(&bytes);
        let mut values = [0.0; 2];
        slice.read_f64_slice_le(&mut values).unwrap();
        assert_eq!(values, [1.0, -2.5]);
        assert_eq!(slice.remaining(), 0);
    }

    #[test]
    fn test_short_read_fails() {
        let bytes = [1u8, 2, 3];
        let mut slice = SketchSlice::new(&bytes);
        assert_eq!(slice.read_u16_le().unwrap(), 0x0201);
        assert!(slice.read_u32_le().is_err());
    }
}
