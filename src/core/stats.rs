//! Robust statistics and streaming smoothers.
//!
//! The centroid of a radar frame is the coordinate-wise median of its
//! points, which keeps multipath ghosts and stray reflections from dragging
//! the body position around. The smoothers are plain exponential moving
//! averages seeded with their first observation.

use super::frame::PointCloud;

/// Median of a slice of finite values. Even lengths average the two middles.
///
/// Returns `None` for an empty slice. The slice is reordered in place.
pub fn median_in_place(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }

    let mid = n / 2;
    let (lower, upper_mid, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper_mid = *upper_mid;

    if n % 2 == 1 {
        return Some(upper_mid);
    }

    // Largest element of the lower half is the other middle value.
    let lower_mid = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((lower_mid + upper_mid) / 2.0)
}

/// Coordinate-wise median of all points with finite coordinates.
///
/// Returns `None` when the cloud has no usable point.
pub fn median_centroid(cloud: &PointCloud) -> Option<[f64; 3]> {
    let n = cloud.len();
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    let mut zs = Vec::with_capacity(n);

    for [x, y, z] in cloud.finite_points() {
        xs.push(x);
        ys.push(y);
        zs.push(z);
    }

    Some([
        median_in_place(&mut xs)?,
        median_in_place(&mut ys)?,
        median_in_place(&mut zs)?,
    ])
}

/// Exponential moving average with a fixed weight on the new sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    /// `alpha` is the weight given to each new sample.
    pub fn new(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    /// Feeds a sample and returns the updated average.
    ///
    /// The first sample seeds the average with its own value.
    #[inline]
    pub fn update(&mut self, sample: f64) -> f64 {
        let next = match self.value {
            None => sample,
            Some(prev) => self.alpha * sample + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }

    #[inline]
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}
