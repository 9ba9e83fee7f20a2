// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Seed the backend               (Layer 5 - ml)
//   Step 2: Build the model                (Layer 5 - ml)
//   Step 3: Open the training source       (Layer 4 - data)
//   Step 4: Run the training loop          (Layer 5 - ml)
//   Step 5: Evaluate on the test log       (Layer 5 - ml)
//   Step 6: Evaluate on the validation log (Layer 5 - ml)
//   Step 7: Report both scores             (Layer 1 - cli callback)
//   Step 8: Persist model.json + weights   (Layer 6 - infra)
//
// Scores are reported before persisting, so a failed save
// still leaves both MSE values on stdout.
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use burn::{module::AutodiffModule, tensor::backend::AutodiffBackend};

use crate::application::sources::open_source;
use crate::data::prefetch::PrefetchConfig;
use crate::infra::{
    checkpoint::{ModelStore, DEFAULT_MODEL_JSON, DEFAULT_WEIGHTS_STEM},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    evaluator::{evaluate, Evaluation},
    model::SteeringModelConfig,
    trainer::{run_training, TrainingConfig},
};

pub const DEFAULT_NUM_TRAIN:    usize = 7698;
pub const DEFAULT_NUM_TEST:     usize = 962;
pub const DEFAULT_NUM_VALIDATE: usize = 962;

// ─── Pipeline Configuration ──────────────────────────────────────────────────
// Everything a training run needs. Serialisable so a run can be
// logged or reproduced from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub train_logs:    PathBuf,
    pub num_train:     usize,
    pub test_logs:     PathBuf,
    pub num_test:      usize,
    pub validate_logs: PathBuf,
    pub num_validate:  usize,
    /// Materialise samples up front instead of streaming them
    pub in_memory:     bool,
    pub prefetch:      PrefetchConfig,
    pub model:         SteeringModelConfig,
    pub training:      TrainingConfig,
    pub model_json:    PathBuf,
    /// Weights path without extension
    pub weights:       PathBuf,
    pub metrics_csv:   Option<PathBuf>,
}

impl PipelineConfig {
    /// Default counts, architecture and hyperparameters for the three logs
    pub fn new(
        train_logs:    impl Into<PathBuf>,
        test_logs:     impl Into<PathBuf>,
        validate_logs: impl Into<PathBuf>,
    ) -> Self {
        Self {
            train_logs:    train_logs.into(),
            num_train:     DEFAULT_NUM_TRAIN,
            test_logs:     test_logs.into(),
            num_test:      DEFAULT_NUM_TEST,
            validate_logs: validate_logs.into(),
            num_validate:  DEFAULT_NUM_VALIDATE,
            in_memory:     false,
            prefetch:      PrefetchConfig::default(),
            model:         SteeringModelConfig::default_architecture(),
            training:      TrainingConfig::new(),
            model_json:    PathBuf::from(DEFAULT_MODEL_JSON),
            weights:       PathBuf::from(DEFAULT_WEIGHTS_STEM),
            metrics_csv:   None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.num_train > 0, "--num_train must be positive");
        ensure!(self.num_test > 0, "--num_test must be positive");
        ensure!(self.num_validate > 0, "--num_validate must be positive");
        ensure!(self.training.epochs > 0, "--epochs must be positive");
        ensure!(self.training.batch_size > 0, "--batch_size must be positive");
        ensure!(self.prefetch.workers > 0, "--workers must be positive");
        self.model.validate()
    }

    pub fn store(&self) -> ModelStore {
        ModelStore::new(&self.model_json, &self.weights)
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub history:    Vec<EpochMetrics>,
    pub test:       Evaluation,
    pub validation: Evaluation,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: PipelineConfig,
}

impl TrainUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute the full training pipeline end to end
    pub fn execute<B: AutodiffBackend>(&self, device: &B::Device) -> Result<TrainReport> {
        self.execute_with::<B>(device, |_, _| {})
    }

    /// Like `execute`, calling `on_scores(test, validation)` once both
    /// evaluations are done and before the model is written.
    pub fn execute_with<B: AutodiffBackend>(
        &self,
        device:    &B::Device,
        on_scores: impl FnOnce(&Evaluation, &Evaluation),
    ) -> Result<TrainReport> {
        let cfg = &self.config;
        cfg.validate()?;

        let mode = if cfg.in_memory { "in-memory" } else { "streaming" };
        tracing::info!("Data mode: {}", mode);

        // ── Step 1: Seed ──────────────────────────────────────────────────────
        B::seed(cfg.training.seed);

        // ── Step 2: Build the model ───────────────────────────────────────────
        let model = cfg.model.init::<B>(device);
        for layer in cfg.model.describe() {
            tracing::info!(
                "{:<12} {:<14} {:>7} params",
                layer.name,
                format!("{:?}", layer.output_shape),
                layer.params
            );
        }

        // ── Step 3: Training source ───────────────────────────────────────────
        let mut train_source = open_source(
            &cfg.train_logs,
            cfg.num_train,
            cfg.in_memory,
            true,
            cfg.training.seed,
            &cfg.prefetch,
        )?;

        let metrics = cfg.metrics_csv.as_ref().map(MetricsLogger::new).transpose()?;

        // ── Step 4: Train ─────────────────────────────────────────────────────
        let (model, history) = run_training(
            model,
            train_source.as_mut(),
            cfg.num_train,
            &cfg.training,
            device,
            metrics.as_ref(),
        )?;
        // Stop the training producer before the evaluation ones start
        drop(train_source);

        // Inference form: dropout off, batch norm on running stats
        let model = model.valid();

        // ── Step 5: Test set ──────────────────────────────────────────────────
        let mut test_source = open_source(
            &cfg.test_logs,
            cfg.num_test,
            cfg.in_memory,
            false,
            cfg.training.seed,
            &cfg.prefetch,
        )?;
        let test = evaluate(
            &model,
            test_source.as_mut(),
            cfg.num_test,
            cfg.training.batch_size,
            cfg.in_memory,
            device,
        )?;
        drop(test_source);
        tracing::info!("Test MSE: {:.6} over {} samples", test.mse, test.samples);

        // ── Step 6: Validation set ────────────────────────────────────────────
        let mut validate_source = open_source(
            &cfg.validate_logs,
            cfg.num_validate,
            cfg.in_memory,
            false,
            cfg.training.seed,
            &cfg.prefetch,
        )?;
        let validation = evaluate(
            &model,
            validate_source.as_mut(),
            cfg.num_validate,
            cfg.training.batch_size,
            cfg.in_memory,
            device,
        )?;
        drop(validate_source);
        tracing::info!(
            "Validation MSE: {:.6} over {} samples",
            validation.mse,
            validation.samples
        );

        // ── Step 7: Report ────────────────────────────────────────────────────
        on_scores(&test, &validation);

        // ── Step 8: Persist ───────────────────────────────────────────────────
        cfg.store().save(&model, &cfg.model)?;

        Ok(TrainReport { history, test, validation })
    }
}
