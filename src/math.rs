use nalgebra as na;
use num_traits::Float;
use std::cmp::Ordering;

/// Ordinary least squares line fit, returns `[slope, intercept]`.
///
/// `None` when there are fewer than two points or `x` has no variance.
pub fn linear_ls<T: na::RealField + Float>(
    x: &na::DVector<T>,
    y: &na::DVector<T>,
) -> Option<na::Vector2<T>> {
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }

    let n = T::from(x.len())?;

    // centered x keeps the normal equations well conditioned for large timestamps
    let x_mean = x.sum() / n;
    let xc = x.map(|x| x - x_mean);

    let s_x = xc.sum();
    let s_x2 = xc.map(|x| x * x).sum();
    let s_xy = xc.zip_map(y, |x, y| x * y).sum();
    let s_y = y.sum();

    let scale = x.map(|x| x * x).sum();
    if s_x2 <= <T as Float>::epsilon() * scale || s_x2 == T::zero() {
        return None;
    }

    let a = na::Matrix2::new(s_x2, s_x, s_x, n);
    let b = na::Vector2::new(s_xy, s_y);

    let qr_result = a.qr();
    let qty = qr_result.q().transpose() * b;
    let beta_hat = qr_result.r().solve_upper_triangular(&qty)?;

    let slope = beta_hat[0];
    let intercept = beta_hat[1] - slope * x_mean;

    if !Float::is_finite(slope) || !Float::is_finite(intercept) {
        return None;
    }

    Some(na::Vector2::new(slope, intercept))
}

/// Coefficient of determination of `y_pred` against `y_true`.
///
/// A constant `y_true` scores 1 when predicted exactly and 0 otherwise.
pub fn r2_score<T: Float>(y_true: &[T], y_pred: &[T]) -> T {
    let n = T::from(y_true.len()).unwrap_or_else(T::zero);
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return T::nan();
    }

    let mean = y_true.iter().fold(T::zero(), |acc, &y| acc + y) / n;

    let ss_res = y_true
        .iter()
        .zip(y_pred)
        .fold(T::zero(), |acc, (&y, &p)| acc + (y - p) * (y - p));
    let ss_tot = y_true
        .iter()
        .fold(T::zero(), |acc, &y| acc + (y - mean) * (y - mean));

    if ss_tot == T::zero() {
        return if ss_res == T::zero() {
            T::one()
        } else {
            T::zero()
        };
    }

    T::one() - ss_res / ss_tot
}

pub fn median<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let two = T::one() + T::one();
        Some((sorted[mid - 1] + sorted[mid]) / two)
    } else {
        Some(sorted[mid])
    }
}

/// Median of absolute deviations from the median
pub fn median_absolute_deviation<T: Float>(values: &[T]) -> Option<T> {
    let med = median(values)?;
    let deviations: Vec<T> = values.iter().map(|&v| (v - med).abs()).collect();

    median(&deviations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_ls_exact_line() {
        let x = na::DVector::from_vec(vec![100.0, 101.0, 102.0, 103.0]);
        let y = x.map(|x: f64| -3.5 * x + 20.0);

        let params = linear_ls(&x, &y).unwrap();

        assert_relative_eq!(params[0], -3.5, epsilon = 1e-9);
        assert_relative_eq!(params[1], 20.0, epsilon = 1e-6);
    }

    #[test]
    fn test_linear_ls_zero_variance() {
        let x = na::DVector::from_vec(vec![2.0f64, 2.0, 2.0]);
        let y = na::DVector::from_vec(vec![1.0, 2.0, 3.0]);

        assert!(linear_ls(&x, &y).is_none());
    }

    #[test]
    fn test_linear_ls_too_short() {
        let x = na::DVector::from_vec(vec![1.0f64]);
        let y = na::DVector::from_vec(vec![1.0]);

        assert!(linear_ls(&x, &y).is_none());
    }

    #[test]
    fn test_r2_score() {
        let y = [1.0, 2.0, 3.0, 4.0];

        assert_relative_eq!(r2_score(&y, &y), 1.0);
        assert_relative_eq!(r2_score(&y, &[2.5, 2.5, 2.5, 2.5]), 0.0);
        assert_relative_eq!(r2_score(&[3.0, 3.0], &[3.0, 3.0]), 1.0);
        assert_relative_eq!(r2_score(&[3.0, 3.0], &[3.0, 4.0]), 0.0);
    }

    #[test]
    fn test_median_and_mad() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median::<f64>(&[]), None);
        assert_eq!(median_absolute_deviation(&[1.0, 2.0, 3.0, 4.0, 100.0]), Some(1.0));
    }
}
