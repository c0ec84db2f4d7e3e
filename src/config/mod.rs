//! Configuration types for the gait pipeline.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("smooth_alpha must be in (0, 1], got {0}")]
    SmoothAlpha(f64),

    #[error("min_step_interval must be finite and non-negative, got {0}")]
    MinStepInterval(f64),

    #[error("fps_hint must be finite and positive, got {0}")]
    FpsHint(f64),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Horizontal axis treated as the walking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ForwardAxis {
    #[default]
    X,
    Y,
}

/// Derived signal that drives step detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StepSignal {
    /// Smoothed centroid height; steps are local minima (heel strike).
    #[default]
    Z,
    /// Smoothed forward speed; steps are local maxima.
    V,
}

/// Configuration for the gait feature extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitConfig {
    /// Walking direction used for the forward-velocity signal
    #[serde(default)]
    pub axis_forward: ForwardAxis,

    /// Signal used for extremum detection
    #[serde(default)]
    pub use_signal: StepSignal,

    /// Refractory period between accepted steps, in seconds
    #[serde(default = "default_min_step_interval")]
    pub min_step_interval: f64,

    /// EMA factor for the forward-velocity and height signals
    #[serde(default = "default_smooth_alpha")]
    pub smooth_alpha: f64,

    /// Expected frame rate, only used to seed the first elapsed time
    #[serde(default)]
    pub fps_hint: Option<f64>,
}

fn default_min_step_interval() -> f64 {
    0.28
}

fn default_smooth_alpha() -> f64 {
    0.2
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            axis_forward: ForwardAxis::default(),
            use_signal: StepSignal::default(),
            min_step_interval: default_min_step_interval(),
            smooth_alpha: default_smooth_alpha(),
            fps_hint: None,
        }
    }
}

impl GaitConfig {
    /// Check value ranges. Called by the extractor before any state exists.
    pub fn validate(&self) -> Result<()> {
        if !(self.smooth_alpha > 0.0 && self.smooth_alpha <= 1.0) {
            return Err(ConfigError::SmoothAlpha(self.smooth_alpha));
        }
        if !self.min_step_interval.is_finite() || self.min_step_interval < 0.0 {
            return Err(ConfigError::MinStepInterval(self.min_step_interval));
        }
        if let Some(fps) = self.fps_hint {
            if !fps.is_finite() || fps <= 0.0 {
                return Err(ConfigError::FpsHint(fps));
            }
        }
        Ok(())
    }
}

/// Where feature rows are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory holding the feature CSV (created if missing)
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// File name of the feature CSV
    #[serde(default = "default_csv_name")]
    pub csv_name: String,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_csv_name() -> String {
    "gait_features.csv".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            csv_name: default_csv_name(),
        }
    }
}

impl OutputConfig {
    /// Full path of the feature CSV.
    pub fn csv_path(&self) -> PathBuf {
        self.out_dir.join(&self.csv_name)
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub gait: GaitConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        config.gait.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_gait_config() {
        let config = GaitConfig::default();
        assert_eq!(config.axis_forward, ForwardAxis::X);
        assert_eq!(config.use_signal, StepSignal::Z);
        assert_eq!(config.min_step_interval, 0.28);
        assert_eq!(config.smooth_alpha, 0.2);
        assert!(config.fps_hint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_output_path() {
        let config = PipelineConfig::default();
        assert_eq!(config.output.csv_path(), PathBuf::from("./gait_features.csv"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GaitConfig::default();
        config.smooth_alpha = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::SmoothAlpha(_))));

        config.smooth_alpha = 1.0;
        assert!(config.validate().is_ok());

        config.min_step_interval = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::MinStepInterval(_))));

        config.min_step_interval = 0.3;
        config.fps_hint = Some(0.0);
        assert!(matches!(config.validate(), Err(ConfigError::FpsHint(_))));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "gait:\n  use_signal: v\n  axis_forward: y\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gait.use_signal, StepSignal::V);
        assert_eq!(config.gait.axis_forward, ForwardAxis::Y);
        assert_eq!(config.gait.min_step_interval, 0.28);
        assert_eq!(config.output.csv_name, "gait_features.csv");
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gait.yaml");

        let mut config = PipelineConfig::default();
        config.gait.fps_hint = Some(20.0);
        config.output.csv_name = "walk.csv".to_string();
        config.to_yaml(&path).unwrap();

        let loaded = PipelineConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_from_yaml_validates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "gait:\n  smooth_alpha: 1.5\n").unwrap();

        assert!(matches!(
            PipelineConfig::from_yaml(&path),
            Err(ConfigError::SmoothAlpha(_))
        ));
    }
}
