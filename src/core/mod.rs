//! Core data types and I/O operations.

pub mod frame;
pub mod loaders;
pub mod stats;
pub mod writers;

pub use frame::{FrameInput, FrameTimestamp, PointCloud, RawFrame};
pub use writers::{format_field, GaitRow, GaitWriter, WriteError, GAIT_HEADER};
