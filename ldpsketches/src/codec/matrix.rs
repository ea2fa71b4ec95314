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

//! Serialized image of an oracle sketch.
//!
//! ```text
//! byte 0      preamble longs (4)
//! byte 1      serial version (1)
//! byte 2      family id
//! byte 3      flags (bit 0: empty)
//! bytes 4-5   hash fingerprint
//! bytes 6-7   reserved
//! bytes 8-11  repetitions (rows)
//! bytes 12-15 width (columns)
//! bytes 16-23 epsilon
//! bytes 24-31 number of aggregated reports
//! then        rows * width cells, row-major, omitted when empty
//! ```
//!
//! All values are little-endian; cells are IEEE 754 doubles written bit-exact.

use tracing::debug;

use super::SketchBytes;
use super::SketchSlice;
use super::assert::ensure_preamble_longs_is;
use super::assert::ensure_serial_version_is;
use super::family::Family;
use crate::common::SketchMatrix;
use crate::error::Error;
use crate::oracle::OracleConfig;

const SERIAL_VERSION: u8 = 1;
const FLAGS_IS_EMPTY: u8 = 1 << 0;
const LONG_SIZE_BYTES: usize = 8;

#[derive(Debug)]
pub(crate) struct SketchImage {
    pub num_reports: u64,
    pub matrix: SketchMatrix,
}

pub(crate) fn encode(
    family: &Family,
    config: &OracleConfig,
    num_reports: u64,
    matrix: &SketchMatrix,
) -> Vec<u8> {
    let is_empty = num_reports == 0;
    let capacity = family.preamble_longs as usize * LONG_SIZE_BYTES
        + if is_empty {
            0
        } else {
            matrix.as_slice().len() * LONG_SIZE_BYTES
        };
    let mut bytes = SketchBytes::with_capacity(capacity);

    bytes.write_u8(family.preamble_longs);
    bytes.write_u8(SERIAL_VERSION);
    bytes.write_u8(family.id);
    bytes.write_u8(if is_empty { FLAGS_IS_EMPTY } else { 0 });
    bytes.write_u16_le(config.hashes().fingerprint());
    bytes.write_u16_le(0); // reserved

    bytes.write_u32_le(config.repetitions());
    bytes.write_u32_le(config.width());
    bytes.write_f64_le(config.epsilon());
    bytes.write_u64_le(num_reports);

    if !is_empty {
        bytes.write_f64_slice_le(matrix.as_slice());
    }
    bytes.into_bytes()
}

pub(crate) fn decode(
    family: &Family,
    bytes: &[u8],
    config: &OracleConfig,
) -> Result<SketchImage, Error> {
    fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
        move |_| Error::insufficient_data(tag)
    }

    let mut cursor = SketchSlice::new(bytes);
    let preamble_longs = cursor.read_u8().map_err(make_error("preamble_longs"))?;
    let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
    let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
    let flags = cursor.read_u8().map_err(make_error("flags"))?;
    let fingerprint = cursor.read_u16_le().map_err(make_error("fingerprint"))?;
    cursor.read_u16_le().map_err(make_error("reserved"))?;

    family.validate_id(family_id)?;
    ensure_serial_version_is(SERIAL_VERSION, serial_version)?;
    ensure_preamble_longs_is(family.preamble_longs, preamble_longs)?;

    let repetitions = cursor.read_u32_le().map_err(make_error("repetitions"))?;
    let width = cursor.read_u32_le().map_err(make_error("width"))?;
    let epsilon = cursor.read_f64_le().map_err(make_error("epsilon"))?;
    let num_reports = cursor.read_u64_le().map_err(make_error("num_reports"))?;

    if fingerprint != config.hashes().fingerprint() {
        return Err(Error::incompatible("incompatible hash fingerprint")
            .with_context("expected", config.hashes().fingerprint())
            .with_context("actual", fingerprint));
    }
    if repetitions != config.repetitions()
        || width != config.width()
        || epsilon.to_bits() != config.epsilon().to_bits()
    {
        return Err(Error::incompatible("serialized sketch has a different configuration")
            .with_context("family", family.name)
            .with_context("repetitions", repetitions)
            .with_context("width", width)
            .with_context("epsilon", epsilon));
    }

    let rows = repetitions as usize;
    let cols = width as usize;
    let is_empty = (flags & FLAGS_IS_EMPTY) != 0;
    if is_empty != (num_reports == 0) {
        return Err(Error::deserial(format!(
            "empty flag disagrees with report count {num_reports}"
        )));
    }
    let expected = if is_empty {
        0
    } else {
        rows * cols * LONG_SIZE_BYTES
    };
    if cursor.remaining() < expected {
        return Err(Error::insufficient_data("cells"));
    }
    if cursor.remaining() > expected {
        return Err(Error::deserial(format!(
            "{} trailing bytes after sketch cells",
            cursor.remaining() - expected
        )));
    }
    let matrix = if is_empty {
        SketchMatrix::zeros(rows, cols)
    } else {
        let mut cells = vec![0.0; rows * cols];
        cursor
            .read_f64_slice_le(&mut cells)
            .map_err(make_error("cells"))?;
        SketchMatrix::from_cells(rows, cols, cells)
    };

    debug!(family = family.name, rows, cols, num_reports, "decoded sketch image");
    Ok(SketchImage {
        num_reports,
        matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn config() -> OracleConfig {
        OracleConfig::builder(1.5, 2, 4).build().unwrap()
    }

    #[test]
    fn test_empty_image_has_preamble_only() {
        let config = config();
        let matrix = SketchMatrix::zeros(2, 4);
        let bytes = encode(&Family::CMS, &config, 0, &matrix);
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[2], Family::CMS.id);
        assert_eq!(bytes[3], FLAGS_IS_EMPTY);

        let image = decode(&Family::CMS, &bytes, &config).unwrap();
        assert_eq!(image.num_reports, 0);
        assert_eq!(image.matrix, matrix);
    }

    #[test]
    fn test_cells_are_bit_exact() {
        let config = config();
        let mut matrix = SketchMatrix::zeros(2, 4);
        matrix.add_row(0, &[0.1, -0.0, f64::MIN_POSITIVE, 3.0]);
        matrix.add(1, 3, -7.25);
        let bytes = encode(&Family::PCS, &config, 2, &matrix);
        assert_eq!(bytes.len(), 32 + 8 * 8);

        let image = decode(&Family::PCS, &bytes, &config).unwrap();
        let restored: Vec<u64> = image.matrix.as_slice().iter().map(|v| v.to_bits()).collect();
        let original: Vec<u64> = matrix.as_slice().iter().map(|v| v.to_bits()).collect();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_rejects_wrong_family_and_truncation() {
        let config = config();
        let matrix = SketchMatrix::zeros(2, 4);
        let bytes = encode(&Family::PCS, &config, 1, &matrix);

        let err = decode(&Family::HCMS, &bytes, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);

        let err = decode(&Family::PCS, &bytes[..bytes.len() - 1], &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);

        let mut longer = bytes.clone();
        longer.push(0);
        assert!(decode(&Family::PCS, &longer, &config).is_err());
    }

    #[test]
    fn test_rejects_other_configuration() {
        let matrix = SketchMatrix::zeros(2, 4);
        let bytes = encode(&Family::CMS, &config(), 1, &matrix);

        let reseeded = OracleConfig::builder(1.5, 2, 4).seed(1).build().unwrap();
        let err = decode(&Family::CMS, &bytes, &reseeded).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleSketch);

        let other_epsilon = OracleConfig::builder(2.0, 2, 4).build().unwrap();
        let err = decode(&Family::CMS, &bytes, &other_epsilon).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleSketch);
    }
}
