//! Stateless numeric primitives shared by the aggregators.
//!
//! These are pure functions over slices. Degenerate inputs come back as
//! [`Statistic::Undefined`] instead of `NaN`.

use crate::statistic::{Degenerate, Statistic};

/// Arithmetic mean. Undefined for an empty slice.
pub fn mean(values: &[f64]) -> Statistic {
    if values.is_empty() {
        return Statistic::Undefined(Degenerate::InsufficientObservations);
    }
    Statistic::Value(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample (Bessel-corrected, N-1) standard deviation, single pass.
///
/// Uses Welford's update so a constant series yields exactly `0.0`.
/// Undefined with fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Statistic {
    if values.len() < 2 {
        return Statistic::Undefined(Degenerate::InsufficientObservations);
    }

    let mut count = 0.0;
    let mut running_mean = 0.0;
    let mut m2 = 0.0;
    for &value in values {
        count += 1.0;
        let delta = value - running_mean;
        running_mean += delta / count;
        m2 += delta * (value - running_mean);
    }

    Statistic::Value((m2 / (count - 1.0)).sqrt())
}

/// Simple return `current / previous - 1`. Undefined when `previous` is zero.
pub fn simple_return(current: f64, previous: f64) -> Statistic {
    Statistic::ratio(current, previous).map(|ratio| ratio - 1.0)
}

/// Pearson correlation of two equally long samples.
///
/// Undefined with fewer than two pairs or when either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Statistic {
    let n = x.len().min(y.len());
    if n < 2 {
        return Statistic::Undefined(Degenerate::InsufficientObservations);
    }
    let (x, y) = (&x[..n], &y[..n]);

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Statistic::Undefined(Degenerate::ZeroVariance);
    }

    // Clamp rounding drift just outside [-1, 1].
    Statistic::Value((covariance / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}
