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

use crate::error::Error;

/// The privacy parameter ε of a local randomizer.
///
/// Smaller values add more noise and give stronger privacy. The flip probabilities derived
/// here calibrate the randomized response steps and must not be altered: a different bias
/// breaks the privacy guarantee without any functional symptom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrivacyBudget {
    epsilon: f64,
}

impl PrivacyBudget {
    /// Creates a budget, rejecting ε that is not a positive finite number or that is so close
    /// to zero that estimates could not be debiased.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ldpsketches::common::PrivacyBudget;
    /// assert!(PrivacyBudget::new(1.0).is_ok());
    /// assert!(PrivacyBudget::new(0.0).is_err());
    /// assert!(PrivacyBudget::new(f64::NAN).is_err());
    /// ```
    pub fn new(epsilon: f64) -> Result<Self, Error> {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(Error::config("epsilon must be a positive finite number")
                .with_context("epsilon", epsilon));
        }
        let budget = Self { epsilon };
        // The coordinate factor is the larger of the two.
        if !budget.coordinate_debias_factor().is_finite() {
            return Err(Error::config("epsilon is too small to debias estimates")
                .with_context("epsilon", epsilon));
        }
        Ok(budget)
    }

    /// Returns ε.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Probability `1 / (1 + e^ε)` of negating the one-hot coordinate of a PCS report.
    pub fn sign_flip_probability(&self) -> f64 {
        1.0 / (1.0 + self.epsilon.exp())
    }

    /// Probability `1 / (1 + e^(ε/2))` of negating a CMS coordinate or an HCMS scalar.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ldpsketches::common::PrivacyBudget;
    /// let p = |e| PrivacyBudget::new(e).unwrap().coordinate_flip_probability();
    /// assert!(p(0.1) > p(1.0));
    /// assert!(p(1.0) > p(10.0));
    /// ```
    pub fn coordinate_flip_probability(&self) -> f64 {
        1.0 / (1.0 + (self.epsilon / 2.0).exp())
    }

    /// Inverse `(e^ε + 1) / (e^ε - 1)` of the attenuation the PCS sign flip applies.
    pub fn sign_debias_factor(&self) -> f64 {
        debias_factor(self.epsilon)
    }

    /// Inverse `(e^(ε/2) + 1) / (e^(ε/2) - 1)` of the attenuation a CMS or HCMS flip applies.
    pub fn coordinate_debias_factor(&self) -> f64 {
        debias_factor(self.epsilon / 2.0)
    }
}

/// `1 / (1 - 2p)` for `p = 1 / (1 + e^x)`, written as `1 + 2 / (e^x - 1)` so that it stays
/// exact for tiny `x` and tends to 1 instead of NaN once `e^x` overflows.
fn debias_factor(x: f64) -> f64 {
    1.0 + 2.0 / x.exp_m1()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive() {
        for epsilon in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(PrivacyBudget::new(epsilon).is_err(), "epsilon {epsilon}");
        }
    }

    #[test]
    fn test_flip_probabilities() {
        let budget = PrivacyBudget::new(2.0).unwrap();
        let e = 2.0f64.exp();
        assert!((budget.sign_flip_probability() - 1.0 / (1.0 + e)).abs() < 1e-15);
        assert!((budget.coordinate_flip_probability() - 1.0 / (1.0 + 1.0f64.exp())).abs() < 1e-15);
    }

    #[test]
    fn test_coordinate_flip_probability_is_monotone() {
        let mut last = 0.5;
        for epsilon in [0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 50.0] {
            let p = PrivacyBudget::new(epsilon)
                .unwrap()
                .coordinate_flip_probability();
            assert!(p < last, "p({epsilon}) = {p} not below {last}");
            last = p;
        }
        let p = PrivacyBudget::new(1000.0)
            .unwrap()
            .coordinate_flip_probability();
        assert!(p < 1e-100);
    }

    #[test]
    fn test_debias_factor_inverts_attenuation() {
        let budget = PrivacyBudget::new(1.0).unwrap();
        let attenuated = 1.0 - 2.0 * budget.coordinate_flip_probability();
        assert!((attenuated * budget.coordinate_debias_factor() - 1.0).abs() < 1e-12);
        let attenuated = 1.0 - 2.0 * budget.sign_flip_probability();
        assert!((attenuated * budget.sign_debias_factor() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_debias_factors_stay_finite_at_extremes() {
        let tiny = PrivacyBudget::new(1e-17).unwrap();
        assert!(tiny.sign_debias_factor().is_finite());
        assert!(tiny.coordinate_debias_factor().is_finite());
        assert!((tiny.sign_debias_factor() * 1e-17 / 2.0 - 1.0).abs() < 1e-9);

        let huge = PrivacyBudget::new(1e6).unwrap();
        assert_eq!(huge.sign_debias_factor(), 1.0);
        assert_eq!(huge.coordinate_debias_factor(), 1.0);
    }

    #[test]
    fn test_rejects_epsilon_without_finite_debias() {
        let err = PrivacyBudget::new(f64::from_bits(1)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ConfigInvalid);
    }
}
