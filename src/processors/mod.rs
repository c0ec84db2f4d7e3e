//! Data processing modules.

pub mod extremum;
pub mod gait;
pub mod session;
pub mod steps;

// Re-export key types for convenience
pub use extremum::{ExtremumDetector, ExtremumKind};
pub use gait::{GaitError, GaitFeatureExtractor};
pub use session::{replay_batch, replay_recording, SessionSummary};
pub use steps::StepTracker;
