//! Outlier rejection by z-score.
//!
//! All statistics here are population statistics (divide by `n`), so the
//! standardized distance of a sample is `|x - mean| / std_dev`.

use crate::error::{Error, Result};

/// Default z-score cutoff.
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Arithmetic mean. `None` for an empty slice.
///
/// Accumulated as a running mean so large finite samples cannot overflow
/// an intermediate sum.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut m = 0.0;
    for (i, x) in samples.iter().enumerate() {
        m += (x - m) / (i + 1) as f64;
    }
    Some(m)
}

/// Population standard deviation. `None` for an empty slice.
pub fn std_dev(samples: &[f64]) -> Option<f64> {
    let m = mean(samples)?;
    let var = mean(&samples.iter().map(|x| (x - m).powi(2)).collect::<Vec<_>>())?;
    Some(var.sqrt())
}

/// Standardized distances `(x - mean) / std_dev`, or `None` when every
/// sample is equal.
///
/// z-scores do not change under scaling, so the samples are first divided
/// by their largest magnitude. That keeps deviations and their squares
/// finite for any finite input.
pub fn z_scores(samples: &[f64]) -> Option<Vec<f64>> {
    let first = *samples.first()?;
    if samples.iter().all(|&x| x == first) {
        return None;
    }
    let scale = samples.iter().fold(0.0f64, |acc, x| acc.max(x.abs()));
    let scaled: Vec<f64> = samples.iter().map(|x| x / scale).collect();
    let m = mean(&scaled)?;
    let sd = std_dev(&scaled)?;
    if sd == 0.0 {
        // Distinct samples can still round to the same scaled value.
        return None;
    }
    Some(scaled.iter().map(|x| (x - m) / sd).collect())
}

fn check_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(Error::invalid(format!(
            "threshold must be a positive finite number, got {threshold}"
        )));
    }
    Ok(())
}

/// Keep the samples whose absolute z-score is strictly below `threshold`.
///
/// Order is preserved. When every sample is equal there is nothing to
/// reject, so the input comes back unchanged.
pub fn outlier_filter(samples: &[f64], threshold: f64) -> Result<Vec<f64>> {
    check_threshold(threshold)?;
    if samples.is_empty() {
        return Err(Error::invalid("outlier filter needs at least one sample"));
    }
    if let Some(bad) = samples.iter().find(|x| !x.is_finite()) {
        return Err(Error::invalid(format!("non-finite sample {bad}")));
    }

    let Some(z) = z_scores(samples) else {
        return Ok(samples.to_vec());
    };

    Ok(samples
        .iter()
        .zip(z)
        .filter(|(_, z)| z.abs() < threshold)
        .map(|(x, _)| *x)
        .collect())
}

/// Mean of the samples that survive [`outlier_filter`].
pub fn filtered_mean(samples: &[f64], threshold: f64) -> Result<f64> {
    let kept = outlier_filter(samples, threshold)?;
    mean(&kept).ok_or_else(|| {
        Error::invalid(format!(
            "threshold {threshold} rejected all {} samples",
            samples.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_variance_keeps_everything() {
        let v = vec![7.5; 12];
        assert_eq!(outlier_filter(&v, DEFAULT_THRESHOLD).unwrap(), v);
    }

    #[test]
    fn empty_input_is_invalid() {
        let err = outlier_filter(&[], DEFAULT_THRESHOLD).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn rejects_bad_threshold() {
        for t in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                outlier_filter(&[1.0, 2.0], t),
                Err(Error::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn rejects_non_finite_samples() {
        assert!(matches!(
            outlier_filter(&[1.0, f64::NAN], DEFAULT_THRESHOLD),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn three_runs_never_exclude_at_two_sigma() {
        // Population std of [1, 2, 100] is ~46.43; z(100) = sqrt(2) < 2.
        let kept = outlier_filter(&[1.0, 2.0, 100.0], 2.0).unwrap();
        assert_eq!(kept, vec![1.0, 2.0, 100.0]);
        let m = filtered_mean(&[1.0, 2.0, 100.0], 2.0).unwrap();
        assert!((m - 103.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_spike_is_dropped() {
        // mean 19, std 27: z(100) = 3, z(10) = 1/3.
        let mut v = vec![10.0; 9];
        v.push(100.0);
        assert_eq!(outlier_filter(&v, 2.0).unwrap(), vec![10.0; 9]);
        assert_eq!(filtered_mean(&v, 2.0).unwrap(), 10.0);
    }

    #[test]
    fn mean_of_nothing_is_an_error() {
        // Both samples sit at |z| = 1.
        assert_eq!(outlier_filter(&[0.0, 1.0], 0.5).unwrap(), Vec::<f64>::new());
        assert!(matches!(
            filtered_mean(&[0.0, 1.0], 0.5),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn equal_samples_survive_a_tight_threshold() {
        // 0.1 has no exact binary form, so a summed mean can land an ulp away.
        assert_eq!(outlier_filter(&[0.1; 3], 0.5).unwrap(), vec![0.1; 3]);
        assert_eq!(filtered_mean(&[0.1; 3], 0.5).unwrap(), 0.1);
    }

    #[test]
    fn huge_samples_do_not_overflow() {
        let v = [1e308; 3];
        assert_eq!(outlier_filter(&v, 2.0).unwrap(), v.to_vec());
        assert_eq!(filtered_mean(&v, 2.0).unwrap(), 1e308);
        assert_eq!(mean(&v), Some(1e308));

        // Spread across the whole range: deviations would overflow unscaled.
        let mut wide = vec![-1.5e308; 9];
        wide.push(1.5e308);
        assert_eq!(outlier_filter(&wide, 2.0).unwrap(), vec![-1.5e308; 9]);
    }

    #[test]
    fn z_scores_match_the_direct_formula() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let z = z_scores(&v).unwrap();
        for (x, z) in v.iter().zip(&z) {
            assert!(((x - 5.0) / 2.0 - z).abs() < 1e-12);
        }
        assert_eq!(z_scores(&[3.0; 4]), None);
        assert_eq!(z_scores(&[]), None);
    }

    #[test]
    fn std_dev_is_population() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn retained_values_are_within_threshold(
            samples in prop::collection::vec(-1.0e6f64..1.0e6, 1..64),
            threshold in 0.1f64..4.0,
        ) {
            let kept = outlier_filter(&samples, threshold).unwrap();
            match z_scores(&samples) {
                None => prop_assert_eq!(kept, samples),
                Some(z) => {
                    let expected: Vec<f64> = samples
                        .iter()
                        .zip(&z)
                        .filter(|(_, z)| z.abs() < threshold)
                        .map(|(x, _)| *x)
                        .collect();
                    prop_assert_eq!(kept, expected);
                }
            }
        }

        #[test]
        fn constant_sequences_pass_through(
            v in -1.0e9f64..1.0e9,
            n in 1usize..50,
            threshold in 0.1f64..4.0,
        ) {
            let samples = vec![v; n];
            prop_assert_eq!(outlier_filter(&samples, threshold).unwrap(), samples);
        }
    }
}
