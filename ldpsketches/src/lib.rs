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

//! Locally differentially private frequency oracles.
//!
//! Each oracle has a client half that privatizes one raw item into a report, and a server
//! half that sums reports into a dense sketch and answers "how many clients held `x`?" with
//! an unbiased estimate. Three oracles are provided:
//!
//! * [`pcs`]: Private Count Sketch, which perturbs a signed one-hot vector.
//! * [`cms`]: Count Mean Sketch, which flips every coordinate of a one-hot vector.
//! * [`hcms`]: Hadamard Count Mean Sketch, which sends one Hadamard coefficient per report.
//!
//! Clients and servers agree through an [`oracle::OracleConfig`] carrying ε, the repetition
//! count and the keyed [`hash::HashFamily`].

pub mod cms;
pub(crate) mod codec;
pub mod common;
pub mod error;
pub mod hash;
pub mod hcms;
pub mod oracle;
pub mod pcs;

pub use self::oracle::ClientPerturber;
pub use self::oracle::FrequencySketch;
