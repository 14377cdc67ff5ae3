//! Numerically careful primitives for reward averaging.
//!
//! Reward histories are short sequences of values in [0,1], but an episode
//! can run for hundreds of steps on the same action. The mean is therefore
//! computed with compensated (Neumaier) summation so that recomputing it
//! from the full history after every append stays exact to within a few ulps.

/// Compensated sum of `values`.
///
/// NaN inputs propagate; an empty slice sums to 0.
pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut compensation = 0.0_f64;
    for &v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

/// Arithmetic mean of `values`.
///
/// The mean of an empty slice is defined as 0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    stable_sum(values) / values.len() as f64
}

/// `numerator / denominator` for unit counts, with a zero denominator
/// defined as a ratio of 0 rather than NaN or infinity.
pub fn ratio_or_zero(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Clamp `value` into [0,1]. NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn mean_single_value() {
        assert!(approx_eq(mean(&[0.25]), 0.25, 1e-15));
    }

    #[test]
    fn mean_basic() {
        assert!(approx_eq(mean(&[0.0, 1.0, 0.5, 0.5]), 0.5, 1e-15));
    }

    #[test]
    fn stable_sum_recovers_small_terms() {
        // Naive summation loses the 1.0 terms entirely.
        let values = [1e16, 1.0, -1e16, 1.0];
        assert!(approx_eq(stable_sum(&values), 2.0, 1e-12));
    }

    #[test]
    fn stable_sum_nan_propagates() {
        assert!(stable_sum(&[0.5, f64::NAN]).is_nan());
    }

    #[test]
    fn ratio_zero_denominator_is_zero() {
        let r = ratio_or_zero(0, 0);
        assert_eq!(r, 0.0);
        assert!(r.is_finite());
        assert_eq!(ratio_or_zero(5, 0), 0.0);
    }

    #[test]
    fn ratio_basic() {
        assert!(approx_eq(ratio_or_zero(1, 3), 1.0 / 3.0, 1e-15));
        assert_eq!(ratio_or_zero(4, 4), 1.0);
    }

    #[test]
    fn clamp_unit_rules() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(0.3), 0.3);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(f64::INFINITY), 1.0);
    }

    proptest! {
        #[test]
        fn mean_matches_naive_for_unit_values(values in prop::collection::vec(0.0f64..=1.0, 1..200)) {
            let naive = values.iter().sum::<f64>() / values.len() as f64;
            prop_assert!(approx_eq(mean(&values), naive, 1e-12));
        }

        #[test]
        fn mean_stays_within_bounds(values in prop::collection::vec(0.0f64..=1.0, 1..200)) {
            let m = mean(&values);
            let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(m >= lo - 1e-12 && m <= hi + 1e-12);
        }

        #[test]
        fn ratio_is_unit_when_numerator_bounded(den in 0u64..1000, frac in 0.0f64..=1.0) {
            let num = (den as f64 * frac).floor() as u64;
            let r = ratio_or_zero(num, den);
            prop_assert!(r.is_finite());
            prop_assert!((0.0..=1.0).contains(&r));
        }
    }
}
