//! Real-time gait feature extraction from radar point cloud streams.
//!
//! This crate provides tools for:
//! - Turning per-frame radar detections into a robust body centroid
//! - Estimating walking speed, step events, step length, step count and cadence
//! - Persisting one feature row per frame to an append-only CSV
//! - Replaying recorded frame streams, singly or as a parallel batch
//!
//! # Example
//!
//! ```no_run
//! use radar_gait::{FrameInput, GaitConfig, GaitFeatureExtractor, OutputConfig, PointCloud};
//!
//! let mut extractor =
//!     GaitFeatureExtractor::create(&GaitConfig::default(), &OutputConfig::default()).unwrap();
//!
//! let cloud = PointCloud::from_xyz(vec![0.1, 0.2], vec![1.0, 1.1], vec![1.2, 1.0]);
//! let row = extractor.update(&FrameInput::new(cloud, 0.05)).unwrap();
//! println!("steps so far: {}", row.step_count);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use crate::config::{ForwardAxis, GaitConfig, OutputConfig, PipelineConfig, StepSignal};
pub use crate::core::frame::{FrameInput, FrameTimestamp, PointCloud};
pub use crate::core::writers::GaitRow;
pub use crate::processors::gait::{GaitError, GaitFeatureExtractor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
