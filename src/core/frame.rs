//! Per-frame input records produced by the upstream radar parser.
//!
//! `FrameInput` is what the gait extractor consumes. `RawFrame` is the
//! serialized shape of the same record (`pointCloud`, `frameNum`,
//! `timeStamp`, `unixTimeMs`) as it appears in recorded JSON streams.

use serde::{Deserialize, Serialize};

/// Container for one frame of radar detections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    /// X coordinates of all points.
    pub x: Vec<f64>,
    /// Y coordinates of all points.
    pub y: Vec<f64>,
    /// Z coordinates of all points.
    pub z: Vec<f64>,
    /// Optional radial velocity per point.
    pub doppler: Option<Vec<f64>>,
    /// Optional signal-to-noise ratio per point.
    pub snr: Option<Vec<f64>>,
}

impl PointCloud {
    /// Creates a new empty point cloud.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new point cloud from coordinate vectors.
    pub fn from_xyz(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        Self {
            x,
            y,
            z,
            doppler: None,
            snr: None,
        }
    }

    /// Builds a cloud from parser rows `[x, y, z, doppler?, snr?, ...]`.
    ///
    /// Rows with fewer than three values are dropped. Doppler and SNR are
    /// kept only when every retained row carries them.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Self {
        let usable: Vec<&[f64]> = rows
            .iter()
            .map(|r| r.as_ref())
            .filter(|r| r.len() >= 3)
            .collect();
        let with_extra = !usable.is_empty() && usable.iter().all(|r| r.len() >= 5);

        let mut cloud = Self::with_capacity(usable.len());
        for row in usable {
            if with_extra {
                cloud.push_detection(row[0], row[1], row[2], row[3], row[4]);
            } else {
                cloud.push(row[0], row[1], row[2]);
            }
        }
        cloud
    }

    /// Creates a new point cloud with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
            doppler: None,
            snr: None,
        }
    }

    /// Returns the number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns true if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Adds a point to the cloud.
    #[inline]
    pub fn push(&mut self, x: f64, y: f64, z: f64) {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
    }

    /// Adds a point with doppler and SNR to the cloud.
    pub fn push_detection(&mut self, x: f64, y: f64, z: f64, doppler: f64, snr: f64) {
        self.push(x, y, z);
        self.doppler
            .get_or_insert_with(|| Vec::with_capacity(self.x.capacity()))
            .push(doppler);
        self.snr
            .get_or_insert_with(|| Vec::with_capacity(self.x.capacity()))
            .push(snr);
    }

    /// Iterates over points whose three coordinates are all finite.
    pub fn finite_points(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((&x, &y), &z)| [x, y, z])
            .filter(|p| p.iter().all(|v| v.is_finite()))
    }
}

/// Frame timestamp as delivered by the parser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameTimestamp {
    /// Seconds as a float.
    Seconds(f64),
    /// Unix time in integer milliseconds.
    UnixMillis(i64),
}

impl FrameTimestamp {
    /// Timestamp in seconds.
    #[inline]
    pub fn as_secs(self) -> f64 {
        match self {
            FrameTimestamp::Seconds(s) => s,
            FrameTimestamp::UnixMillis(ms) => ms as f64 / 1000.0,
        }
    }
}

/// One frame handed to the gait extractor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub point_cloud: Option<PointCloud>,
    pub frame_num: Option<i64>,
    pub timestamp: Option<FrameTimestamp>,
}

impl FrameInput {
    /// Frame with a point cloud and a timestamp in seconds.
    pub fn new(point_cloud: PointCloud, seconds: f64) -> Self {
        Self {
            point_cloud: Some(point_cloud),
            frame_num: None,
            timestamp: Some(FrameTimestamp::Seconds(seconds)),
        }
    }

    /// Frame with no point cloud at all.
    pub fn empty(seconds: f64) -> Self {
        Self {
            point_cloud: None,
            frame_num: None,
            timestamp: Some(FrameTimestamp::Seconds(seconds)),
        }
    }

    pub fn with_frame_num(mut self, frame_num: i64) -> Self {
        self.frame_num = Some(frame_num);
        self
    }

    /// Timestamp in seconds, or `wall_clock()` when the frame carries none.
    pub fn resolve_timestamp<F: FnOnce() -> f64>(&self, wall_clock: F) -> f64 {
        match self.timestamp {
            Some(ts) => ts.as_secs(),
            None => wall_clock(),
        }
    }
}

/// Serialized frame record, field names as emitted by the parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFrame {
    #[serde(rename = "pointCloud", default, skip_serializing_if = "Option::is_none")]
    pub point_cloud: Option<Vec<Vec<f64>>>,

    #[serde(rename = "frameNum", default, skip_serializing_if = "Option::is_none")]
    pub frame_num: Option<i64>,

    #[serde(rename = "timeStamp", default, skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<f64>,

    #[serde(rename = "unixTimeMs", default, skip_serializing_if = "Option::is_none")]
    pub unix_time_ms: Option<i64>,
}

impl From<RawFrame> for FrameInput {
    fn from(raw: RawFrame) -> Self {
        // Seconds win when both are present.
        let timestamp = raw
            .time_stamp
            .map(FrameTimestamp::Seconds)
            .or(raw.unix_time_ms.map(FrameTimestamp::UnixMillis));

        FrameInput {
            point_cloud: raw.point_cloud.map(|rows| PointCloud::from_rows(&rows)),
            frame_num: raw.frame_num,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_cloud_operations() {
        let mut cloud = PointCloud::new();
        assert!(cloud.is_empty());

        cloud.push(1.0, 2.0, 3.0);
        cloud.push(4.0, 5.0, 6.0);

        assert_eq!(cloud.len(), 2);
        assert!(cloud.doppler.is_none());
        let points: Vec<[f64; 3]> = cloud.finite_points().collect();
        assert_eq!(points, vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_from_rows_drops_short_rows() {
        let rows = vec![vec![1.0, 2.0, 3.0, 0.5, 12.0], vec![4.0, 5.0], vec![7.0, 8.0, 9.0, -0.5, 10.0]];
        let cloud = PointCloud::from_rows(&rows);

        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.z, vec![3.0, 9.0]);
        assert_eq!(cloud.doppler, Some(vec![0.5, -0.5]));
        assert_eq!(cloud.snr, Some(vec![12.0, 10.0]));
    }

    #[test]
    fn test_from_rows_mixed_width_keeps_xyz_only() {
        let rows = vec![vec![1.0, 2.0, 3.0, 0.5, 12.0], vec![4.0, 5.0, 6.0]];
        let cloud = PointCloud::from_rows(&rows);

        assert_eq!(cloud.len(), 2);
        assert!(cloud.doppler.is_none());
        assert!(cloud.snr.is_none());
    }

    #[test]
    fn test_finite_points_skips_nan() {
        let cloud = PointCloud::from_xyz(vec![1.0, f64::NAN], vec![0.0, 0.0], vec![1.0, 1.0]);
        assert_eq!(cloud.finite_points().count(), 1);
    }

    #[test]
    fn test_timestamp_resolution() {
        let frame = FrameInput::new(PointCloud::new(), 1.5);
        assert_eq!(frame.resolve_timestamp(|| 99.0), 1.5);

        let frame = FrameInput {
            timestamp: Some(FrameTimestamp::UnixMillis(2_500)),
            ..Default::default()
        };
        assert_eq!(frame.resolve_timestamp(|| 99.0), 2.5);

        let frame = FrameInput::default();
        assert_eq!(frame.resolve_timestamp(|| 99.0), 99.0);
    }

    #[test]
    fn test_raw_frame_prefers_seconds() {
        let raw: RawFrame = serde_json::from_str(
            r#"{"pointCloud": [[0, 0, 1.0]], "frameNum": 7, "timeStamp": 3.25, "unixTimeMs": 1000}"#,
        )
        .unwrap();
        let frame = FrameInput::from(raw);

        assert_eq!(frame.frame_num, Some(7));
        assert_eq!(frame.timestamp, Some(FrameTimestamp::Seconds(3.25)));
        assert_eq!(frame.point_cloud.map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_raw_frame_missing_fields() {
        let raw: RawFrame = serde_json::from_str(r#"{"unixTimeMs": 1700000000123}"#).unwrap();
        let frame = FrameInput::from(raw);

        assert!(frame.point_cloud.is_none());
        assert!(frame.frame_num.is_none());
        assert_eq!(frame.timestamp, Some(FrameTimestamp::UnixMillis(1_700_000_000_123)));
    }
}
