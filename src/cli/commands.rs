// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Training is the default action, driven by top-level flags.
// `evaluate` and `predict` work from a saved model.
//
// The training flags keep their historical underscore spelling
// (--train_logs, --num_train, --in_memory, ...) so existing
// scripts keep working.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::{anyhow, Result};
use clap::{ArgAction, Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::train_use_case::{
    PipelineConfig, DEFAULT_NUM_TEST, DEFAULT_NUM_TRAIN, DEFAULT_NUM_VALIDATE,
};
use crate::data::prefetch::PrefetchConfig;
use crate::infra::checkpoint::{ModelStore, DEFAULT_MODEL_JSON, DEFAULT_WEIGHTS_STEM};
use crate::ml::trainer::TrainingConfig;

/// Which Burn backend runs the model
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// GPU through wgpu (Vulkan / Metal / DX12)
    #[default]
    Wgpu,
    /// CPU fallback
    Ndarray,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a saved model on a driving log
    Evaluate(EvaluateArgs),

    /// Predict steering angles for camera frames with a saved model
    Predict(PredictArgs),
}

/// Flags for a training run. Each field becomes a --flag.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Driving log used for training
    #[arg(long = "train_logs")]
    pub train_logs: Option<PathBuf>,

    /// Samples drawn from the training log per epoch
    #[arg(long = "num_train", default_value_t = DEFAULT_NUM_TRAIN)]
    pub num_train: usize,

    /// Driving log used for the test score
    #[arg(long = "test_logs")]
    pub test_logs: Option<PathBuf>,

    #[arg(long = "num_test", default_value_t = DEFAULT_NUM_TEST)]
    pub num_test: usize,

    /// Driving log used for the validation score
    #[arg(long = "validate_logs")]
    pub validate_logs: Option<PathBuf>,

    #[arg(long = "num_validate", default_value_t = DEFAULT_NUM_VALIDATE)]
    pub num_validate: usize,

    /// Decode all samples up front instead of streaming them.
    /// A bare `--in_memory` means true.
    #[arg(
        long = "in_memory",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub in_memory: bool,

    /// Number of full passes over `num_train` samples
    #[arg(long, default_value_t = 25)]
    pub epochs: usize,

    #[arg(long = "batch_size", default_value_t = 32)]
    pub batch_size: usize,

    /// Image decode threads in streaming mode
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Seed for weight init and in-memory shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Append per-epoch metrics to this CSV file
    #[arg(long = "metrics_csv")]
    pub metrics_csv: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = BackendKind::Wgpu)]
    pub backend: BackendKind,
}

fn required(path: Option<PathBuf>, flag: &str) -> Result<PathBuf> {
    path.ok_or_else(|| anyhow!("{flag} is required"))
}

/// Convert CLI TrainArgs into the application-layer PipelineConfig.
/// The application layer never sees clap types.
impl TryFrom<TrainArgs> for PipelineConfig {
    type Error = anyhow::Error;

    fn try_from(a: TrainArgs) -> Result<Self> {
        let mut cfg = PipelineConfig::new(
            required(a.train_logs, "--train_logs")?,
            required(a.test_logs, "--test_logs")?,
            required(a.validate_logs, "--validate_logs")?,
        );

        cfg.num_train    = a.num_train;
        cfg.num_test     = a.num_test;
        cfg.num_validate = a.num_validate;
        cfg.in_memory    = a.in_memory;
        cfg.prefetch     = PrefetchConfig {
            workers:    a.workers,
            chunk_size: a.batch_size.max(1),
            ..PrefetchConfig::default()
        };
        cfg.training = TrainingConfig::new()
            .with_epochs(a.epochs)
            .with_batch_size(a.batch_size)
            .with_seed(a.seed);
        cfg.metrics_csv = a.metrics_csv;

        cfg.validate()?;
        Ok(cfg)
    }
}

/// Where a saved model lives
#[derive(Args, Debug, Clone)]
pub struct ModelPaths {
    /// Architecture description written by training
    #[arg(long = "model_json", default_value = DEFAULT_MODEL_JSON)]
    pub model_json: PathBuf,

    /// Weights path; the .mpk extension is added automatically
    #[arg(long, default_value = DEFAULT_WEIGHTS_STEM)]
    pub weights: PathBuf,
}

impl ModelPaths {
    pub fn store(&self) -> ModelStore {
        ModelStore::new(&self.model_json, &self.weights)
    }
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Driving log to score
    #[arg(long)]
    pub logs: PathBuf,

    #[arg(long = "num_samples", default_value_t = DEFAULT_NUM_TEST)]
    pub num_samples: usize,

    #[arg(
        long = "in_memory",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub in_memory: bool,

    #[arg(long = "batch_size", default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    #[command(flatten)]
    pub model: ModelPaths,

    #[arg(long, value_enum, default_value_t = BackendKind::Wgpu)]
    pub backend: BackendKind,
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Camera frames to score
    #[arg(required = true, num_args = 1..)]
    pub images: Vec<PathBuf>,

    #[command(flatten)]
    pub model: ModelPaths,

    #[arg(long, value_enum, default_value_t = BackendKind::Wgpu)]
    pub backend: BackendKind,
}
