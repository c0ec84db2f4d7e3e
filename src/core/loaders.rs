//! Loaders for recorded radar frame streams.
//!
//! Two recording layouts are supported:
//! - JSON Lines: one parser record per line, with the parser's field names
//!   (`pointCloud`, `frameNum`, `timeStamp`, `unixTimeMs`)
//! - CSV: one detected point per row with `frame`, `timestamp`, `x`, `y`,
//!   `z` and optional `doppler`, `snr` columns; consecutive rows sharing a
//!   frame number form one frame

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;

use super::frame::{FrameInput, FrameTimestamp, PointCloud, RawFrame};

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported recording format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Recording layout, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingFormat {
    JsonLines,
    Csv,
}

/// Detect the recording layout from the file extension.
pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<RecordingFormat> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jsonl" | "json" | "ndjson" => Ok(RecordingFormat::JsonLines),
        "csv" => Ok(RecordingFormat::Csv),
        _ => Err(LoaderError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// True if `path` has an extension `detect_format` understands.
pub fn is_recording(path: &Path) -> bool {
    path.is_file() && detect_format(path).is_ok()
}

/// Load all frames of a recording, dispatching on its format.
pub fn load_frames<P: AsRef<Path>>(path: P) -> Result<Vec<FrameInput>> {
    let path = path.as_ref();
    match detect_format(path)? {
        RecordingFormat::JsonLines => load_frames_jsonl(path),
        RecordingFormat::Csv => load_frames_csv(path),
    }
}

/// Load frames from a JSON Lines recording.
///
/// Blank lines are skipped. Points with fewer than three values are dropped.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a line is not a valid
/// frame record, or the file holds no frames.
pub fn load_frames_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<FrameInput>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut frames = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let raw: RawFrame = serde_json::from_str(trimmed).map_err(|e| LoaderError::Json {
            line: i + 1,
            source: e,
        })?;
        frames.push(FrameInput::from(raw));
    }

    if frames.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(frames)
}

/// Parse an optional field. Missing columns and empty cells are `None`.
fn parse_field<T: FromStr>(
    record: &StringRecord,
    idx: Option<usize>,
    name: &str,
    line: usize,
) -> Result<Option<T>> {
    let Some(raw) = idx.and_then(|i| record.get(i)) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }

    raw.parse().map(Some).map_err(|_| {
        LoaderError::ParseError(format!("line {}: invalid {} value '{}'", line, name, raw))
    })
}

/// Load frames from a point-per-row CSV recording.
///
/// The CSV needs `frame`, `x`, `y` and `z` columns (case-insensitive);
/// `timestamp` (seconds), `doppler` and `snr` are optional. A row whose
/// x, y or z cell is empty contributes a frame without adding a point,
/// which is how frames with no detections are recorded.
///
/// # Errors
///
/// Returns an error if the file cannot be read, lacks required columns,
/// contains unparsable numbers, or holds no rows.
pub fn load_frames_csv<P: AsRef<Path>>(path: P) -> Result<Vec<FrameInput>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let col_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect();

    let missing: Vec<&str> = ["frame", "x", "y", "z"]
        .into_iter()
        .filter(|name| !col_map.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(LoaderError::MissingColumns(missing.join(", ")));
    }

    let frame_idx = col_map.get("frame").copied();
    let ts_idx = col_map.get("timestamp").copied();
    let x_idx = col_map.get("x").copied();
    let y_idx = col_map.get("y").copied();
    let z_idx = col_map.get("z").copied();
    let doppler_idx = col_map.get("doppler").copied();
    let snr_idx = col_map.get("snr").copied();
    let with_extra = doppler_idx.is_some() && snr_idx.is_some();

    let mut frames: Vec<FrameInput> = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        // Header is line 1.
        let line = i + 2;

        let frame_num: i64 = parse_field(&record, frame_idx, "frame", line)?.ok_or_else(|| {
            LoaderError::ParseError(format!("line {}: missing frame number", line))
        })?;

        let starts_frame = frames.last().map(|f| f.frame_num) != Some(Some(frame_num));
        if starts_frame {
            let timestamp = parse_field::<f64>(&record, ts_idx, "timestamp", line)?
                .map(FrameTimestamp::Seconds);
            frames.push(FrameInput {
                point_cloud: Some(PointCloud::new()),
                frame_num: Some(frame_num),
                timestamp,
            });
        }

        let x = parse_field::<f64>(&record, x_idx, "x", line)?;
        let y = parse_field::<f64>(&record, y_idx, "y", line)?;
        let z = parse_field::<f64>(&record, z_idx, "z", line)?;
        let (Some(x), Some(y), Some(z)) = (x, y, z) else {
            continue;
        };

        let Some(cloud) = frames.last_mut().and_then(|f| f.point_cloud.as_mut()) else {
            continue;
        };

        if with_extra {
            let doppler = parse_field(&record, doppler_idx, "doppler", line)?.unwrap_or(f64::NAN);
            let snr = parse_field(&record, snr_idx, "snr", line)?.unwrap_or(f64::NAN);
            cloud.push_detection(x, y, z, doppler, snr);
        } else {
            cloud.push(x, y, z);
        }
    }

    if frames.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(frames)
}
