//! Append-only CSV sink for gait feature rows.
//!
//! One row is written per processed frame. The file is opened in append mode
//! and the header is only written when the file is new or empty, so a session
//! can be resumed into an existing file without duplicating the header.
//! Undefined and non-finite values are written as empty fields.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use thiserror::Error;

/// Column header of the feature file.
pub const GAIT_HEADER: [&str; 11] = [
    "timestamp",
    "frame",
    "cx",
    "cy",
    "cz",
    "v_walk",
    "step_event",
    "step_time",
    "step_length",
    "step_count",
    "cadence_spm",
];

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for appending.
    #[error("failed to open file '{path}': {source}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to flush data to the sink.
    #[error("failed to write to '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// One output record. `None` fields are written empty.
#[derive(Debug, Clone, PartialEq)]
pub struct GaitRow {
    /// Frame time in seconds.
    pub timestamp: f64,
    /// Frame index, -1 when the parser gave none.
    pub frame: i64,
    /// Median centroid `[cx, cy, cz]`.
    pub centroid: Option<[f64; 3]>,
    /// Planar walking speed.
    pub v_walk: Option<f64>,
    pub step_event: bool,
    /// Seconds since the previous accepted step.
    pub step_time: Option<f64>,
    pub step_length: Option<f64>,
    /// Cumulative accepted steps.
    pub step_count: u64,
    /// Steps per minute over the trailing window.
    pub cadence_spm: f64,
}

impl GaitRow {
    /// Formats the row as CSV fields in header order.
    pub fn to_record(&self) -> [String; 11] {
        let [cx, cy, cz] = match self.centroid {
            Some([x, y, z]) => [Some(x), Some(y), Some(z)],
            None => [None, None, None],
        };

        [
            format_field(Some(self.timestamp)),
            self.frame.to_string(),
            format_field(cx),
            format_field(cy),
            format_field(cz),
            format_field(self.v_walk),
            u8::from(self.step_event).to_string(),
            format_field(self.step_time),
            format_field(self.step_length),
            self.step_count.to_string(),
            format_field(Some(self.cadence_spm)),
        ]
    }
}

/// Six-decimal fixed formatting, empty for missing or non-finite values.
pub fn format_field(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.6}", v),
        _ => String::new(),
    }
}

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Row sink over any writer. Every row is flushed before `write_row` returns.
pub struct GaitWriter<W: Write> {
    inner: csv::Writer<W>,
    label: String,
}

impl GaitWriter<File> {
    /// Opens `path` for appending, creating it (and its parents) if needed.
    ///
    /// The header is written only when the file is new or empty.
    pub fn open(path: &Path) -> Result<Self> {
        ensure_parent_dirs(path)?;

        let label = path.display().to_string();
        let needs_header = match fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| WriteError::OpenFile {
                path: label.clone(),
                source: e,
            })?;

        if needs_header {
            log::info!("Creating gait feature file {}", label);
        } else {
            log::info!("Appending to existing gait feature file {}", label);
        }

        Self::with_label(file, needs_header, label)
    }
}

impl<W: Write> GaitWriter<W> {
    /// Wraps an arbitrary writer, optionally writing the header first.
    pub fn from_writer(writer: W, write_header: bool) -> Result<Self> {
        Self::with_label(writer, write_header, "<writer>".to_string())
    }

    fn with_label(writer: W, write_header: bool, label: String) -> Result<Self> {
        let inner = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        let mut sink = Self { inner, label };

        if write_header {
            sink.write_fields(&GAIT_HEADER)?;
        }
        Ok(sink)
    }

    /// Appends one row and flushes it.
    pub fn write_row(&mut self, row: &GaitRow) -> Result<()> {
        self.write_fields(&row.to_record())
    }

    fn write_fields<I, T>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.inner
            .write_record(fields)
            .map_err(|e| WriteError::CsvError {
                path: self.label.clone(),
                source: e,
            })?;

        self.inner.flush().map_err(|e| WriteError::WriteFile {
            path: self.label.clone(),
            source: e,
        })
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        let label = self.label;
        self.inner.into_inner().map_err(|e| WriteError::WriteFile {
            path: label,
            source: e.into_error(),
        })
    }
}
