//! Regression metrics over a held-out partition.

use ndarray::ArrayView1;

pub fn mean_squared_error(actual: &ArrayView1<f64>, predicted: &ArrayView1<f64>) -> f64 {
    let total: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p) * (a - p))
        .sum();

    total / actual.len() as f64
}

/// Coefficient of determination. A constant `actual` has no variance to
/// explain, so it scores 1.0 on a perfect fit and 0.0 otherwise
pub fn r2_score(actual: &ArrayView1<f64>, predicted: &ArrayView1<f64>) -> f64 {
    let mean = actual.sum() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean) * (a - mean)).sum();

    if ss_tot == 0f64 {
        return if ss_res == 0f64 { 1f64 } else { 0f64 };
    }

    1f64 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse() {
        let actual = array![3.0, -0.5, 2.0, 7.0];
        let predicted = array![2.5, 0.0, 2.0, 8.0];

        assert_eq!(mean_squared_error(&actual.view(), &predicted.view()), 0.375);
    }

    #[test]
    fn test_r2() {
        let actual = array![3.0, -0.5, 2.0, 7.0];
        let predicted = array![2.5, 0.0, 2.0, 8.0];
        let r2 = r2_score(&actual.view(), &predicted.view());

        assert!((r2 - 0.948_608_137_044_967_9).abs() < 1e-12);
        assert_eq!(r2_score(&actual.view(), &actual.view()), 1.0);
    }

    #[test]
    fn test_r2_can_go_negative() {
        let actual = array![1.0, 2.0, 3.0];
        let predicted = array![3.0, 2.0, 1.0];

        assert_eq!(r2_score(&actual.view(), &predicted.view()), -3.0);
    }

    #[test]
    fn test_r2_constant_target() {
        let actual = array![5.0, 5.0];

        assert_eq!(r2_score(&actual.view(), &array![5.0, 5.0].view()), 1.0);
        assert_eq!(r2_score(&actual.view(), &array![4.0, 6.0].view()), 0.0);
    }
}
