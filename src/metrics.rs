/// Compute summary metrics (mean, median, 25th percentile, 75th percentile) from samples
pub fn compute_metrics(samples: &[f64]) -> Option<(f64, f64, f64, f64)> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let mean = samples.iter().sum::<f64>() / n as f64;
    let median = sorted[n / 2];
    let p25 = sorted[n / 4];
    let p75 = sorted[3 * n / 4];
    Some((mean, median, p25, p75))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quartiles_by_index() {
        let (mean, med, p25, p75) = compute_metrics(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(mean, 2.5);
        assert_eq!(med, 3.0);
        assert_eq!(p25, 2.0);
        assert_eq!(p75, 4.0);
    }

    #[test]
    fn empty_has_no_metrics() {
        assert!(compute_metrics(&[]).is_none());
    }
}
