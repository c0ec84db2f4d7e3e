//! Adaptive-threshold extremum detection on a streaming signal.
//!
//! A candidate extremum is a sign change of the first difference. It only
//! counts when the sample stands out from a slow running mean by more than
//! half the running standard deviation, which rejects the small wiggles
//! left over after smoothing.
//!
//! The running mean and variance use their own fixed decay, independent of
//! the smoothing applied upstream to the signal itself.

/// Weight kept by the running mean and variance on each update.
pub const THRESHOLD_DECAY: f64 = 0.9;

/// Minimum distance from the running mean, in standard deviations.
pub const PROMINENCE_SIGMA: f64 = 0.5;

/// Lower bound on the running variance before taking its square root.
pub const VARIANCE_FLOOR: f64 = 1e-9;

/// Which turning point is being searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    /// Falling then rising, sample below the running mean.
    Minimum,
    /// Rising then falling, sample above the running mean.
    Maximum,
}

/// Streaming extremum detector with an adaptive prominence gate.
#[derive(Debug, Clone)]
pub struct ExtremumDetector {
    kind: ExtremumKind,
    mean: Option<f64>,
    variance: f64,
    prev_value: Option<f64>,
    prev_slope: f64,
}

impl ExtremumDetector {
    pub fn new(kind: ExtremumKind) -> Self {
        Self {
            kind,
            mean: None,
            variance: 0.0,
            prev_value: None,
            prev_slope: 0.0,
        }
    }

    /// Feeds one sample; returns true if it is a prominent extremum.
    ///
    /// Slope and value history advance on every call, whether or not the
    /// sample is reported.
    pub fn update(&mut self, value: f64) -> bool {
        let slope = value - self.prev_value.unwrap_or(value);

        let prev_mean = self.mean.unwrap_or(value);
        let mean = THRESHOLD_DECAY * prev_mean + (1.0 - THRESHOLD_DECAY) * value;
        let deviation = value - mean;
        self.variance =
            THRESHOLD_DECAY * self.variance + (1.0 - THRESHOLD_DECAY) * deviation * deviation;
        self.mean = Some(mean);

        let gate = PROMINENCE_SIGMA * self.sigma();
        let is_extremum = match self.kind {
            ExtremumKind::Minimum => self.prev_slope < 0.0 && slope >= 0.0 && mean - value > gate,
            ExtremumKind::Maximum => self.prev_slope > 0.0 && slope < 0.0 && value - mean > gate,
        };

        self.prev_slope = slope;
        self.prev_value = Some(value);
        is_extremum
    }

    /// Running standard deviation used by the prominence gate.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.variance.max(VARIANCE_FLOOR).sqrt()
    }

    /// Running mean, `None` before the first sample.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        self.mean
    }
}
