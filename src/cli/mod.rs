//! Command-line interface for the gait pipeline.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{ForwardAxis, GaitConfig, OutputConfig, StepSignal};
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "radar-gait")]
#[command(about = "Gait feature extraction from radar point cloud streams", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Per-run overrides of the gait configuration.
#[derive(Args, Debug, Default)]
struct GaitArgs {
    /// Horizontal axis treated as the walking direction
    #[arg(long, value_enum)]
    axis_forward: Option<ForwardAxis>,

    /// Signal driving step detection (z: height minima, v: speed peaks)
    #[arg(long, value_enum)]
    signal: Option<StepSignal>,

    /// Minimum seconds between two accepted steps
    #[arg(long)]
    min_step_interval: Option<f64>,

    /// EMA smoothing factor in (0, 1]
    #[arg(long)]
    smooth_alpha: Option<f64>,

    /// Expected frame rate
    #[arg(long)]
    fps_hint: Option<f64>,
}

impl GaitArgs {
    fn apply(&self, base: &GaitConfig) -> GaitConfig {
        GaitConfig {
            axis_forward: self.axis_forward.unwrap_or(base.axis_forward),
            use_signal: self.signal.unwrap_or(base.use_signal),
            min_step_interval: self.min_step_interval.unwrap_or(base.min_step_interval),
            smooth_alpha: self.smooth_alpha.unwrap_or(base.smooth_alpha),
            fps_hint: self.fps_hint.or(base.fps_hint),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Replay one recorded frame stream (.jsonl or .csv) into a feature CSV
    Replay {
        /// Recording to replay
        input: PathBuf,
        /// Output directory (defaults to config output.out_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Output file name (defaults to config output.csv_name)
        #[arg(long)]
        csv_name: Option<String>,
        #[command(flatten)]
        gait: GaitArgs,
    },

    /// Replay every recording in a directory, one feature CSV each
    Batch {
        /// Directory containing recordings
        input_dir: PathBuf,
        /// Output directory for feature CSVs
        output_dir: PathBuf,
        /// Limit number of recordings to process
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        gait: GaitArgs,
    },

    /// Write the default configuration to a YAML file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            let head: String = value.chars().take(35).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

fn format_optional(value: Option<f64>, unit: &str) -> String {
    value
        .map(|v| format!("{:.3} {}", v, unit))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Replay { input, out_dir, csv_name, gait } => {
            let output = OutputConfig {
                out_dir: out_dir.unwrap_or_else(|| config.output.out_dir.clone()),
                csv_name: csv_name.unwrap_or_else(|| config.output.csv_name.clone()),
            };
            cmd_replay(&input, &gait.apply(&config.gait), &output);
        }
        Commands::Batch { input_dir, output_dir, limit, gait } => {
            cmd_batch(&input_dir, &output_dir, limit, &gait.apply(&config.gait));
        }
        Commands::InitConfig { path } => {
            cmd_init_config(&path, &config);
        }
    }
}

fn cmd_replay(input: &Path, gait: &GaitConfig, output: &OutputConfig) {
    use crate::processors::session;

    let start = Instant::now();

    println!("Replaying recording...");
    println!("Input: {}", input.display());
    println!("Output: {}", output.csv_path().display());

    let spinner = create_spinner("Extracting gait features...");

    match session::replay_recording(input, gait, output) {
        Ok(summary) => {
            spinner.finish_and_clear();

            print_summary(
                "Replay Complete",
                &[
                    ("Input file", summary.input.display().to_string()),
                    ("Output file", summary.output.display().to_string()),
                    ("Frames", summary.frames.to_string()),
                    ("Empty frames", summary.empty_frames.to_string()),
                    ("Steps", summary.steps.to_string()),
                    ("Final cadence", format!("{:.1} spm", summary.final_cadence_spm)),
                    ("Mean speed", format_optional(summary.mean_speed, "m/s")),
                    ("Signal", format!("{:?}", gait.use_signal)),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Replay failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_batch(input_dir: &Path, output_dir: &Path, limit: Option<usize>, gait: &GaitConfig) {
    use crate::processors::session;

    let start = Instant::now();

    println!("Replaying recordings in batch mode...");
    println!("Input directory: {}", input_dir.display());
    println!("Output directory: {}", output_dir.display());
    if let Some(lim) = limit {
        println!("Processing limit: {} recordings", lim);
    }

    let spinner = create_spinner("Extracting gait features...");

    let results = match session::replay_batch(input_dir, output_dir, gait, limit) {
        Ok(results) => results,
        Err(e) => {
            spinner.finish_and_clear();
            error!("Batch replay failed: {:#}", e);
            std::process::exit(1);
        }
    };

    spinner.finish_and_clear();

    let mut total_frames = 0;
    let mut total_steps = 0;
    let mut failed = 0;
    for (input, result) in &results {
        match result {
            Ok(summary) => {
                println!(
                    "{}: {} frames, {} steps -> {}",
                    input.file_name().unwrap_or_default().to_string_lossy(),
                    summary.frames,
                    summary.steps,
                    summary.output.display()
                );
                total_frames += summary.frames;
                total_steps += summary.steps;
            }
            Err(e) => {
                eprintln!("{}: failed: {:#}", input.display(), e);
                failed += 1;
            }
        }
    }

    print_summary(
        "Batch Replay Complete",
        &[
            ("Input directory", input_dir.display().to_string()),
            ("Output directory", output_dir.display().to_string()),
            ("Recordings", results.len().to_string()),
            ("Failed", failed.to_string()),
            ("Frames", total_frames.to_string()),
            ("Steps", total_steps.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn cmd_init_config(path: &Path, config: &PipelineConfig) {
    match config.to_yaml(path) {
        Ok(()) => println!("Wrote configuration to {}", path.display()),
        Err(e) => {
            error!("Failed to write config to {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
