// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One loop for both data paths. Each epoch pulls
// `samples_per_epoch` samples from a SampleSource in batches of
// `batch_size` (the last batch may be smaller) and runs
//
//   forward → MSE loss → backward → Adam step
//
// for every batch. Whether the source replays an in-memory set
// or streams fresh samples is invisible here.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::time::Instant;

use crate::data::batcher::SteeringBatcher;
use crate::domain::traits::SampleSource;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::SteeringModel;

#[derive(Config, Debug)]
pub struct TrainingConfig {
    #[config(default = "25")]
    pub epochs:        usize,
    #[config(default = "32")]
    pub batch_size:    usize,
    /// Adam's default step size
    #[config(default = "1e-3")]
    pub learning_rate: f64,
    #[config(default = "42")]
    pub seed:          u64,
}

/// Fit `model` on samples drawn from `source`.
///
/// Returns the trained model and one EpochMetrics per epoch.
pub fn run_training<B: AutodiffBackend>(
    model:             SteeringModel<B>,
    source:            &mut dyn SampleSource,
    samples_per_epoch: usize,
    cfg:               &TrainingConfig,
    device:            &B::Device,
    metrics:           Option<&MetricsLogger>,
) -> Result<(SteeringModel<B>, Vec<EpochMetrics>)> {
    ensure!(samples_per_epoch > 0, "samples per epoch must be positive");
    ensure!(cfg.batch_size > 0, "batch size must be positive");

    let mut model = model;

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();
    let batcher   = SteeringBatcher::<B>::new(device.clone());

    tracing::info!(
        "Training for {} epochs on {} ({} samples/epoch, batch size {})",
        cfg.epochs, source.name(), samples_per_epoch, cfg.batch_size
    );

    let mut history = Vec::with_capacity(cfg.epochs);

    for epoch in 1..=cfg.epochs {
        let started       = Instant::now();
        let mut remaining = samples_per_epoch;
        let mut loss_sum  = 0.0f64;
        let mut seen      = 0usize;

        while remaining > 0 {
            let items = source.next_batch(remaining.min(cfg.batch_size))?;
            ensure!(!items.is_empty(), "{} returned an empty batch", source.name());

            let n     = items.len();
            let batch = batcher.batch(items);

            let (loss, _) = model.forward_loss(batch.images, batch.targets);

            // Weight by batch size so a short final batch counts proportionally
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum  += loss_val * n as f64;
            seen      += n;
            remaining  = remaining.saturating_sub(n);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        let epoch_metrics = EpochMetrics::new(
            epoch,
            loss_sum / seen as f64,
            seen,
            started.elapsed().as_secs_f64(),
        );

        tracing::info!(
            "Epoch {:>3}/{} | loss={:.6} | samples={} | {:.1}s",
            epoch, cfg.epochs, epoch_metrics.train_loss, seen, epoch_metrics.seconds
        );
        if !epoch_metrics.train_loss.is_finite() {
            tracing::warn!("Training loss is not finite at epoch {}", epoch);
        }

        if let Some(logger) = metrics {
            logger.log(&epoch_metrics)?;
        }
        history.push(epoch_metrics);
    }

    tracing::info!("Training complete");
    Ok((model, history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::{InMemorySource, SampleSet};
    use crate::domain::sample::{DrivingSample, IMAGE_LEN};
    use crate::ml::backend::CpuTrainBackend;
    use crate::ml::model::SteeringModelConfig;

    fn constant_target_source(count: usize, angle: f32) -> InMemorySource {
        let samples = (0..count)
            .map(|i| {
                let image = (0..IMAGE_LEN).map(|p| ((p * (i + 3)) % 17) as f32 / 17.0).collect();
                DrivingSample::new(image, angle).unwrap()
            })
            .collect();
        InMemorySource::new(SampleSet::new(samples), true, 1).unwrap()
    }

    #[test]
    fn test_reports_one_entry_per_epoch() {
        let device = Default::default();
        let model  = SteeringModelConfig::default_architecture().init::<CpuTrainBackend>(&device);
        let mut source = constant_target_source(6, 0.4);
        let cfg = TrainingConfig::new().with_epochs(3).with_batch_size(4);

        let (_, history) = run_training(model, &mut source, 6, &cfg, &device, None).unwrap();

        assert_eq!(history.len(), 3);
        for (i, m) in history.iter().enumerate() {
            assert_eq!(m.epoch, i + 1);
            assert_eq!(m.samples, 6);
            assert!(m.train_loss.is_finite());
        }
    }

    #[test]
    fn test_loss_goes_down_on_constant_target() {
        let device = Default::default();
        let model  = SteeringModelConfig::default_architecture()
            .with_dropout(0.0)
            .init::<CpuTrainBackend>(&device);
        let mut source = constant_target_source(8, 0.5);
        let cfg = TrainingConfig::new()
            .with_epochs(40)
            .with_batch_size(8)
            .with_learning_rate(1e-2);

        let (_, history) = run_training(model, &mut source, 8, &cfg, &device, None).unwrap();

        let first = history.first().unwrap().train_loss;
        let last  = history.last().unwrap().train_loss;
        assert!(last < first, "loss did not decrease: {first} -> {last}");
    }

    #[test]
    fn test_zero_samples_rejected() {
        let device = Default::default();
        let model  = SteeringModelConfig::default_architecture().init::<CpuTrainBackend>(&device);
        let mut source = constant_target_source(2, 0.1);
        let cfg = TrainingConfig::new();
        assert!(run_training(model, &mut source, 0, &cfg, &device, None).is_err());
    }
}
