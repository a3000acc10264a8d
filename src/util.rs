//! Small statistics helpers shared by the analysis, calibration, and
//! outlier-filtering code. Empirical (n-1) covariance, interpolated
//! quantiles, Pearson regression.

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Empirical covariance of two paired series. `None` for fewer than two
/// pairs, where no spread can be estimated.
pub fn covariance(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n <= 1 {
        return None;
    }

    let mean_a = mean(&a[..n])?;
    let mean_b = mean(&b[..n])?;

    let sum = a[..n]
        .iter()
        .zip(&b[..n])
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>();

    Some(sum / (n - 1) as f64)
}

pub fn variance(data: &[f64]) -> Option<f64> {
    covariance(data, data)
}

/// Quantile of an ascending-sorted slice, linearly interpolating between
/// order statistics at `index = (p/100) * (n-1)`.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let index = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let remainder = index - lower as f64;

    if remainder == 0.0 {
        Some(sorted[lower])
    } else {
        Some(sorted[lower] + remainder * (sorted[lower + 1] - sorted[lower]))
    }
}

/// Tukey fence `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]` of an ascending-sorted
/// slice. `None` for fewer than four samples, where the quartiles are
/// too weakly determined to reject anything.
pub fn tukey_fence(sorted: &[f64]) -> Option<(f64, f64)> {
    if sorted.len() < 4 {
        return None;
    }

    let q1 = quantile(sorted, 25.0)?;
    let q3 = quantile(sorted, 75.0)?;
    let iqr = q3 - q1;

    Some((q1 - 1.5 * iqr, q3 + 1.5 * iqr))
}

/// A least-squares line fit `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Solve `y = intercept + slope * x` for x. `None` when the line is
    /// flat and the inversion would divide by zero.
    pub fn invert(&self, y: f64) -> Option<f64> {
        if self.slope == 0.0 {
            None
        } else {
            Some((y - self.intercept) / self.slope)
        }
    }
}

/// Pearson-based linear regression of `y` on `x`. `None` with fewer
/// than two pairs, with no x spread, or when the fit degenerates to
/// non-finite coefficients.
pub fn linear_regression(y: &[f64], x: &[f64]) -> Option<LinearFit> {
    let n = y.len().min(x.len());
    if n < 2 {
        return None;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;

    for i in 0..n {
        sum_x += x[i];
        sum_y += y[i];
        sum_xy += x[i] * y[i];
        sum_xx += x[i] * x[i];
        sum_yy += y[i] * y[i];
    }

    let nf = n as f64;
    let denom = nf * sum_xx - sum_x * sum_x;
    if denom == 0.0 {
        return None;
    }

    let slope = (nf * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / nf;

    let spread = denom * (nf * sum_yy - sum_y * sum_y);
    let r_squared = if spread > 0.0 {
        let r = (nf * sum_xy - sum_x * sum_y) / spread.sqrt();
        r * r
    } else {
        // all y identical: the flat line is an exact fit
        1.0
    };

    if slope.is_finite() && intercept.is_finite() {
        Some(LinearFit {
            slope,
            intercept,
            r_squared,
        })
    } else {
        None
    }
}
