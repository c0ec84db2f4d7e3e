//! Offline replay of recorded frame streams through the gait extractor.
//!
//! Each recording is one session: a fresh extractor, frames fed strictly in
//! recorded order, one output CSV. Batch mode runs independent sessions in
//! parallel with rayon; no state is shared between them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;

use crate::config::{GaitConfig, OutputConfig};
use crate::core::loaders::{is_recording, load_frames};

use super::gait::GaitFeatureExtractor;

/// Outcome of one replayed recording.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub frames: usize,
    /// Frames without a usable centroid.
    pub empty_frames: usize,
    pub steps: u64,
    /// Cadence at the last frame, steps per minute.
    pub final_cadence_spm: f64,
    /// Mean of the defined walking speeds, `None` if there were none.
    pub mean_speed: Option<f64>,
}

/// Replay one recording, appending rows to the CSV described by `output`.
pub fn replay_recording(
    input: &Path,
    config: &GaitConfig,
    output: &OutputConfig,
) -> Result<SessionSummary> {
    let frames = load_frames(input)
        .with_context(|| format!("Failed to load recording: {}", input.display()))?;

    let out_path = output.csv_path();
    let mut extractor = GaitFeatureExtractor::create(config, output)
        .with_context(|| format!("Failed to open output: {}", out_path.display()))?;

    let mut empty_frames = 0;
    let mut speed_sum = 0.0;
    let mut speed_samples = 0usize;
    let mut final_cadence_spm = 0.0;

    for frame in &frames {
        let row = extractor
            .update(frame)
            .with_context(|| format!("Failed to write row to {}", out_path.display()))?;

        if row.centroid.is_none() {
            empty_frames += 1;
        }
        if let Some(v) = row.v_walk.filter(|v| v.is_finite()) {
            speed_sum += v;
            speed_samples += 1;
        }
        final_cadence_spm = row.cadence_spm;
    }

    let steps = extractor.step_count();
    extractor
        .finish()
        .with_context(|| format!("Failed to flush {}", out_path.display()))?;

    info!(
        "{}: {} frames, {} steps -> {}",
        input.display(),
        frames.len(),
        steps,
        out_path.display()
    );

    Ok(SessionSummary {
        input: input.to_path_buf(),
        output: out_path,
        frames: frames.len(),
        empty_frames,
        steps,
        final_cadence_spm,
        mean_speed: (speed_samples > 0).then(|| speed_sum / speed_samples as f64),
    })
}

/// Recordings directly inside `input_dir`, sorted by path.
pub fn find_recordings(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut recordings: Vec<PathBuf> = fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read directory: {}", input_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_recording(path))
        .collect();

    recordings.sort();
    Ok(recordings)
}

/// Output file name for a recording: `<stem>_<ext>_gait_features.csv`.
///
/// The extension is part of the name so `walk.jsonl` and `walk.csv` in the
/// same directory never share an output file.
pub fn output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "recording".to_string());
    match input.extension() {
        Some(ext) => format!("{}_{}_gait_features.csv", stem, ext.to_string_lossy()),
        None => format!("{}_gait_features.csv", stem),
    }
}

/// Replay every recording in `input_dir` in parallel.
///
/// Results come back in input order. A failing recording is reported in its
/// slot and does not stop the others.
pub fn replay_batch(
    input_dir: &Path,
    output_dir: &Path,
    config: &GaitConfig,
    limit: Option<usize>,
) -> Result<Vec<(PathBuf, Result<SessionSummary>)>> {
    config.validate().context("Invalid gait configuration")?;

    let recordings: Vec<PathBuf> = find_recordings(input_dir)?
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    if recordings.is_empty() {
        warn!("No recordings found in {}", input_dir.display());
    }

    let results = recordings
        .into_par_iter()
        .map(|input| {
            let output = OutputConfig {
                out_dir: output_dir.to_path_buf(),
                csv_name: output_name(&input),
            };
            let result = replay_recording(&input, config, &output);
            if let Err(e) = &result {
                warn!("{}: {:#}", input.display(), e);
            }
            (input, result)
        })
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_walk_jsonl(path: &Path) {
        let mut file = File::create(path).unwrap();
        let zs = [1.0, 1.0, 1.0, 0.8, 1.0, 0.8, 1.0];
        for (i, z) in zs.iter().enumerate() {
            writeln!(
                file,
                r#"{{"frameNum": {}, "timeStamp": {}, "pointCloud": [[{}, 0.0, {}]]}}"#,
                i,
                i as f64,
                0.5 * i as f64,
                z
            )
            .unwrap();
        }
        writeln!(file, r#"{{"frameNum": 7, "timeStamp": 7.0}}"#).unwrap();
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name(Path::new("/data/walk_01.jsonl")), "walk_01_jsonl_gait_features.csv");
        assert_eq!(output_name(Path::new("walk_01.csv")), "walk_01_csv_gait_features.csv");
    }

    #[test]
    fn test_replay_batch_shared_stem() {
        let dir = TempDir::new().unwrap();
        write_walk_jsonl(&dir.path().join("walk.jsonl"));
        fs::write(
            dir.path().join("walk.csv"),
            "frame,timestamp,x,y,z\n0,0.0,0.0,0.0,1.0\n1,1.0,0.5,0.0,1.0\n2,2.0,1.0,0.0,0.8\n",
        )
        .unwrap();

        let output_dir = dir.path().join("features");
        let results = replay_batch(dir.path(), &output_dir, &GaitConfig::default(), None).unwrap();

        assert_eq!(results.len(), 2);
        let outputs: Vec<PathBuf> = results
            .iter()
            .map(|(_, r)| r.as_ref().unwrap().output.clone())
            .collect();
        assert_ne!(outputs[0], outputs[1]);

        // Each file holds exactly one session: a header plus its own rows.
        let csv_rows = fs::read_to_string(output_dir.join("walk_csv_gait_features.csv")).unwrap();
        assert_eq!(csv_rows.lines().count(), 4);
        let jsonl_rows = fs::read_to_string(output_dir.join("walk_jsonl_gait_features.csv")).unwrap();
        assert_eq!(jsonl_rows.lines().count(), 9);
    }

    #[test]
    fn test_replay_recording() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("walk.jsonl");
        write_walk_jsonl(&input);

        let output = OutputConfig {
            out_dir: dir.path().join("out"),
            csv_name: "walk.csv".to_string(),
        };
        let summary = replay_recording(&input, &GaitConfig::default(), &output).unwrap();

        assert_eq!(summary.frames, 8);
        assert_eq!(summary.empty_frames, 1);
        assert_eq!(summary.steps, 2);
        assert!((summary.mean_speed.unwrap() - 0.5).abs() < 1e-6);

        let content = fs::read_to_string(&summary.output).unwrap();
        assert_eq!(content.lines().count(), 9);
    }

    #[test]
    fn test_replay_recording_missing_input() {
        let dir = TempDir::new().unwrap();
        let output = OutputConfig {
            out_dir: dir.path().to_path_buf(),
            csv_name: "x.csv".to_string(),
        };
        let result = replay_recording(&dir.path().join("nope.jsonl"), &GaitConfig::default(), &output);
        assert!(result.is_err());
    }

    #[test]
    fn test_replay_batch() {
        let dir = TempDir::new().unwrap();
        let input_dir = dir.path().join("recordings");
        fs::create_dir_all(&input_dir).unwrap();

        write_walk_jsonl(&input_dir.join("a.jsonl"));
        write_walk_jsonl(&input_dir.join("b.jsonl"));
        fs::write(input_dir.join("broken.jsonl"), "{not json\n").unwrap();
        fs::write(input_dir.join("notes.txt"), "ignored").unwrap();

        let output_dir = dir.path().join("features");
        let results = replay_batch(&input_dir, &output_dir, &GaitConfig::default(), None).unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_ok());
        assert!(results[2].1.is_err());
        assert!(output_dir.join("a_jsonl_gait_features.csv").exists());
        assert!(output_dir.join("b_jsonl_gait_features.csv").exists());
    }

    #[test]
    fn test_replay_batch_limit() {
        let dir = TempDir::new().unwrap();
        write_walk_jsonl(&dir.path().join("a.jsonl"));
        write_walk_jsonl(&dir.path().join("b.jsonl"));

        let output_dir = dir.path().join("features");
        let results = replay_batch(dir.path(), &output_dir, &GaitConfig::default(), Some(1)).unwrap();

        assert_eq!(results.len(), 1);
        assert!(!output_dir.join("b_jsonl_gait_features.csv").exists());
    }
}
