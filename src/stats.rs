//! Small, pure statistical helpers shared by the bias and co-occurrence
//! analyzers, favoring numerically stable formulations over textbook ones.

/// Herfindahl-Hirschman Index over percentage shares (0–100), normalized to
/// `[0, 1]` by dividing the raw HHI (max 10000) by 10000.
///
/// Empty input yields 0; a single full share yields 1.
pub fn hhi_normalized(percentages: &[f64]) -> f64 {
    if percentages.is_empty() {
        return 0.0;
    }
    let raw: f64 = percentages.iter().map(|p| p * p).sum();
    (raw / 10_000.0).clamp(0.0, 1.0)
}

/// Population coefficient of variation: `stddev / mean`, clamped to `[0,1]`.
/// Returns 0 when the mean is 0 or there are fewer than 2 values (no
/// variation to speak of).
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean.abs() < 1e-12 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (variance.sqrt() / mean).clamp(0.0, 1.0)
}

/// Mutual information on a 2×2 contingency table `{both, only_a, only_b,
/// neither}` out of `total`, with Laplace smoothing (+0.5 per cell) to avoid
/// `log(0)`.
pub fn mutual_information_2x2(both: u64, only_a: u64, only_b: u64, neither: u64) -> f64 {
    let smoothed = [
        both as f64 + 0.5,
        only_a as f64 + 0.5,
        only_b as f64 + 0.5,
        neither as f64 + 0.5,
    ];
    let n: f64 = smoothed.iter().sum();

    let p_a_present = (smoothed[0] + smoothed[1]) / n;
    let p_a_absent = (smoothed[2] + smoothed[3]) / n;
    let p_b_present = (smoothed[0] + smoothed[2]) / n;
    let p_b_absent = (smoothed[1] + smoothed[3]) / n;

    let cells = [
        (smoothed[0] / n, p_a_present, p_b_present),
        (smoothed[1] / n, p_a_present, p_b_absent),
        (smoothed[2] / n, p_a_absent, p_b_present),
        (smoothed[3] / n, p_a_absent, p_b_absent),
    ];

    cells
        .iter()
        .map(|(p_xy, p_x, p_y)| {
            if *p_xy <= 0.0 || *p_x <= 0.0 || *p_y <= 0.0 {
                0.0
            } else {
                p_xy * (p_xy / (p_x * p_y)).ln()
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hhi_empty_is_zero() {
        assert_eq!(hhi_normalized(&[]), 0.0);
    }

    #[test]
    fn hhi_single_cms_is_one() {
        assert!((hhi_normalized(&[100.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hhi_even_split_is_lower_than_concentrated() {
        let even = hhi_normalized(&[50.0, 50.0]);
        let concentrated = hhi_normalized(&[90.0, 10.0]);
        assert!(even < concentrated);
    }

    #[test]
    fn cv_constant_values_is_zero() {
        assert_eq!(coefficient_of_variation(&[0.5, 0.5, 0.5]), 0.0);
    }

    #[test]
    fn cv_single_value_is_zero() {
        assert_eq!(coefficient_of_variation(&[0.5]), 0.0);
    }

    #[test]
    fn cv_varying_values_is_positive() {
        assert!(coefficient_of_variation(&[0.1, 0.9]) > 0.0);
    }

    #[test]
    fn mi_independent_variables_near_zero() {
        // both present in half the population, independently.
        let mi = mutual_information_2x2(25, 25, 25, 25);
        assert!(mi.abs() < 0.05);
    }

    #[test]
    fn mi_perfectly_correlated_is_positive() {
        let mi = mutual_information_2x2(50, 0, 0, 50);
        assert!(mi > 0.3);
    }

    #[test]
    fn mi_handles_zero_cells_without_panicking() {
        let mi = mutual_information_2x2(0, 0, 0, 100);
        assert!(mi.is_finite());
    }
}
