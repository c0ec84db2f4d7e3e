//! Real-time gait feature extraction from radar point cloud frames.
//!
//! [`GaitFeatureExtractor`] is a long-lived streaming object. It is fed one
//! frame at a time, in arrival order, and appends exactly one row to its
//! sink per frame:
//!
//! 1. median centroid of the frame's points
//! 2. planar walking speed from the centroid displacement
//! 3. EMA smoothing of forward displacement and height
//! 4. adaptive-threshold extremum detection on the chosen signal
//! 5. refractory-gated step bookkeeping and trailing-window cadence
//!
//! Frames without usable points still produce a row (with empty spatial
//! fields) so the output keeps one row per frame.
//!
//! # Example
//!
//! ```no_run
//! use radar_gait::config::{GaitConfig, OutputConfig};
//! use radar_gait::core::frame::{FrameInput, PointCloud};
//! use radar_gait::processors::gait::GaitFeatureExtractor;
//!
//! let mut extractor =
//!     GaitFeatureExtractor::create(&GaitConfig::default(), &OutputConfig::default()).unwrap();
//! let cloud = PointCloud::from_xyz(vec![0.0], vec![0.0], vec![1.0]);
//! let row = extractor.update(&FrameInput::new(cloud, 0.0)).unwrap();
//! assert_eq!(row.step_count, 0);
//! ```

use std::fs::File;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, trace};
use thiserror::Error;

use crate::config::{ConfigError, ForwardAxis, GaitConfig, OutputConfig, StepSignal};
use crate::core::frame::FrameInput;
use crate::core::stats::{median_centroid, Ema};
use crate::core::writers::{GaitRow, GaitWriter, WriteError};

use super::extremum::{ExtremumDetector, ExtremumKind};
use super::steps::StepTracker;

/// Floor on the elapsed time between frames, in seconds.
pub const MIN_DT: f64 = 1e-6;

/// Frame index written when the parser provides none.
pub const UNKNOWN_FRAME: i64 = -1;

/// Errors returned by the extractor.
#[derive(Error, Debug)]
pub enum GaitError {
    #[error("invalid gait configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Result type for extractor operations.
pub type Result<T> = std::result::Result<T, GaitError>;

/// Seconds since the Unix epoch.
pub fn wall_clock_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Mutable session state. Only [`GaitFeatureExtractor::update`] touches it.
#[derive(Debug, Clone)]
struct DetectorState {
    prev_centroid: Option<[f64; 3]>,
    prev_timestamp: Option<f64>,
    forward_speed: Ema,
    height: Ema,
    extremum: ExtremumDetector,
    steps: StepTracker,
}

impl DetectorState {
    fn new(config: &GaitConfig) -> Self {
        let kind = match config.use_signal {
            StepSignal::Z => ExtremumKind::Minimum,
            StepSignal::V => ExtremumKind::Maximum,
        };

        Self {
            prev_centroid: None,
            prev_timestamp: None,
            forward_speed: Ema::new(config.smooth_alpha),
            height: Ema::new(config.smooth_alpha),
            extremum: ExtremumDetector::new(kind),
            steps: StepTracker::new(config.min_step_interval),
        }
    }
}

/// Per-frame values that may be undefined. Feeds the single row builder.
#[derive(Debug, Default)]
struct FrameFeatures {
    centroid: Option<[f64; 3]>,
    v_walk: Option<f64>,
    step_event: bool,
    step_time: Option<f64>,
    step_length: Option<f64>,
}

/// Streaming gait feature extractor writing to `W`.
pub struct GaitFeatureExtractor<W: Write = File> {
    config: GaitConfig,
    sink: GaitWriter<W>,
    clock: fn() -> f64,
    state: DetectorState,
}

impl GaitFeatureExtractor<File> {
    /// Creates an extractor appending to the CSV described by `output`.
    ///
    /// The configuration is checked before the file is touched, so an
    /// invalid config never creates an output file.
    pub fn create(config: &GaitConfig, output: &OutputConfig) -> Result<Self> {
        config.validate()?;
        let sink = GaitWriter::open(&output.csv_path())?;
        Ok(Self::build(config.clone(), sink))
    }
}

impl<W: Write> GaitFeatureExtractor<W> {
    /// Creates an extractor over an existing sink.
    pub fn with_writer(config: GaitConfig, sink: GaitWriter<W>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, sink))
    }

    fn build(config: GaitConfig, sink: GaitWriter<W>) -> Self {
        debug!(
            "Gait extractor: axis={:?} signal={:?} min_step_interval={} alpha={}",
            config.axis_forward, config.use_signal, config.min_step_interval, config.smooth_alpha
        );

        let state = DetectorState::new(&config);
        Self {
            config,
            sink,
            clock: wall_clock_secs,
            state,
        }
    }

    /// Replaces the wall clock used for frames without a timestamp.
    pub fn with_clock(mut self, clock: fn() -> f64) -> Self {
        self.clock = clock;
        self
    }

    /// Processes one frame and appends its row to the sink.
    ///
    /// Must be called once per frame in arrival order. Only sink failures
    /// are errors; missing data yields a row with empty fields.
    pub fn update(&mut self, frame: &FrameInput) -> Result<GaitRow> {
        let now = frame.resolve_timestamp(self.clock);
        let frame_idx = frame.frame_num.unwrap_or(UNKNOWN_FRAME);

        let Some(centroid) = frame.point_cloud.as_ref().and_then(median_centroid) else {
            trace!("Frame {} at {:.3}s has no usable points", frame_idx, now);
            let row = self.emit(now, frame_idx, FrameFeatures::default())?;
            self.state.prev_timestamp = Some(now);
            return Ok(row);
        };

        let mut features = FrameFeatures {
            centroid: Some(centroid),
            ..FrameFeatures::default()
        };

        if let (Some(prev), Some(dt)) = (self.state.prev_centroid, self.elapsed(now)) {
            self.track_motion(now, prev, centroid, dt, &mut features);
        }

        let row = self.emit(now, frame_idx, features)?;
        self.state.prev_centroid = Some(centroid);
        self.state.prev_timestamp = Some(now);
        Ok(row)
    }

    /// Elapsed time since the previous frame, `None` when undefined.
    fn elapsed(&self, now: f64) -> Option<f64> {
        match self.state.prev_timestamp {
            None => self.config.fps_hint.map(|fps| 1.0 / fps),
            Some(prev) => {
                let dt = now - prev;
                dt.is_finite().then(|| dt.max(MIN_DT))
            }
        }
    }

    fn track_motion(
        &mut self,
        now: f64,
        prev: [f64; 3],
        centroid: [f64; 3],
        dt: f64,
        features: &mut FrameFeatures,
    ) {
        let dx = centroid[0] - prev[0];
        let dy = centroid[1] - prev[1];
        let v_walk = dx.hypot(dy) / dt;
        features.v_walk = Some(v_walk);

        let forward = match self.config.axis_forward {
            ForwardAxis::X => dx.abs(),
            ForwardAxis::Y => dy.abs(),
        };

        let state = &mut self.state;
        let forward_smooth = state.forward_speed.update(forward);
        let height_smooth = state.height.update(centroid[2]);

        let signal = match self.config.use_signal {
            StepSignal::Z => height_smooth,
            StepSignal::V => forward_smooth,
        };

        if !state.extremum.update(signal) || !state.steps.refractory_ok(now) {
            return;
        }

        let step_time = state.steps.record(now);
        features.step_event = true;
        features.step_time = step_time;
        features.step_length = step_time.map(|t| v_walk * t);

        debug!(
            "Step {} at {:.3}s (signal={:.4}, sigma={:.4}, step_time={:?})",
            state.steps.count(),
            now,
            signal,
            state.extremum.sigma(),
            step_time
        );
    }

    /// Builds the row for this frame and appends it.
    fn emit(&mut self, now: f64, frame: i64, features: FrameFeatures) -> Result<GaitRow> {
        let row = GaitRow {
            timestamp: now,
            frame,
            centroid: features.centroid,
            v_walk: features.v_walk,
            step_event: features.step_event,
            step_time: features.step_time,
            step_length: features.step_length,
            step_count: self.state.steps.count(),
            cadence_spm: self.state.steps.cadence(now),
        };

        self.sink.write_row(&row)?;
        Ok(row)
    }

    /// Cumulative accepted steps.
    pub fn step_count(&self) -> u64 {
        self.state.steps.count()
    }

    /// Ends the session, flushing and returning the sink's writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.sink.into_inner()?)
    }
}
