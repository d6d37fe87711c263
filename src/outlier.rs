use crate::config::{OUTLIER_SCALE, OUTLIER_THRESHOLD};

/// Median of a list of floats. Even-length lists average the two middle
/// elements; NaNs sort last under total ordering.
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Remove statistical outliers from one channel's samples using the
/// modified z-score test (Iglewicz and Hoaglin 1993): a sample is rejected
/// when `0.6745 * d / median(d)` exceeds 3.5, where `d` is its Euclidean
/// distance from the channel's component-wise median.
///
/// When the median distance is zero (every sample identical) nothing is
/// rejected. A NaN-valued sample always fails the keep test and is
/// rejected; callers fall back to the unfiltered list if that empties the
/// channel.
pub fn filter_outliers<const N: usize>(values: &[[f64; N]]) -> Vec<[f64; N]> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut center = [0.0; N];
    for axis in 0..N {
        center[axis] = median(values.iter().map(|v| v[axis]).collect());
    }

    let distances: Vec<f64> = values
        .iter()
        .map(|v| {
            v.iter()
                .zip(center.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt()
        })
        .collect();

    let mad = median(distances.clone());
    if mad == 0.0 {
        return values.to_vec();
    }

    values
        .iter()
        .zip(distances.iter())
        .filter(|(_, d)| OUTLIER_SCALE * *d / mad <= OUTLIER_THRESHOLD)
        .map(|(v, _)| *v)
        .collect()
}
