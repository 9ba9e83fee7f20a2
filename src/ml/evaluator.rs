// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Runs a trained model over `num_samples` samples from a
// SampleSource and reports the mean squared error.
//
// With `keep_predictions` the per-sample predictions and labels
// are returned alongside the MSE (in-memory mode); otherwise
// they are only accumulated (streaming mode).

use anyhow::{ensure, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::batcher::SteeringBatcher;
use crate::domain::traits::SampleSource;
use crate::infra::metrics::mean_squared_error;
use crate::ml::model::SteeringModel;

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub mse:         f64,
    pub samples:     usize,
    pub predictions: Option<Vec<f32>>,
    pub labels:      Option<Vec<f32>>,
}

/// Score `model` on the next `num_samples` samples of `source`.
///
/// Pass a model on a non-autodiff backend (`model.valid()`) so
/// dropout is off and batch norm uses its running statistics.
pub fn evaluate<B: Backend>(
    model:            &SteeringModel<B>,
    source:           &mut dyn SampleSource,
    num_samples:      usize,
    batch_size:       usize,
    keep_predictions: bool,
    device:           &B::Device,
) -> Result<Evaluation> {
    ensure!(num_samples > 0, "cannot evaluate on zero samples");
    ensure!(batch_size > 0, "batch size must be positive");

    let batcher = SteeringBatcher::<B>::new(device.clone());

    let mut predictions = Vec::with_capacity(num_samples);
    let mut labels      = Vec::with_capacity(num_samples);
    let mut remaining   = num_samples;

    while remaining > 0 {
        let items = source.next_batch(remaining.min(batch_size))?;
        ensure!(!items.is_empty(), "{} returned an empty batch", source.name());
        remaining = remaining.saturating_sub(items.len());

        labels.extend(items.iter().map(|s| s.angle));

        let batch  = batcher.batch(items);
        let output = model.forward(batch.images);
        let values = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read predictions: {e:?}"))?;
        predictions.extend(values);
    }

    let mse = mean_squared_error(&predictions, &labels)?;
    tracing::debug!("Evaluated {} samples from {}: mse={:.6}", labels.len(), source.name(), mse);

    let samples = labels.len();
    let (predictions, labels) = if keep_predictions {
        (Some(predictions), Some(labels))
    } else {
        (None, None)
    };

    Ok(Evaluation { mse, samples, predictions, labels })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::{InMemorySource, SampleSet};
    use crate::domain::sample::{DrivingSample, IMAGE_LEN};
    use crate::ml::backend::CpuBackend;
    use crate::ml::model::SteeringModelConfig;

    fn source(count: usize) -> InMemorySource {
        let samples = (0..count)
            .map(|i| DrivingSample::new(vec![i as f32 / 10.0; IMAGE_LEN], 0.1 * i as f32).unwrap())
            .collect();
        InMemorySource::new(SampleSet::new(samples), false, 0).unwrap()
    }

    #[test]
    fn test_keeps_predictions_when_asked() {
        let device = Default::default();
        let model  = SteeringModelConfig::default_architecture().init::<CpuBackend>(&device);
        let mut src = source(5);

        let eval = evaluate(&model, &mut src, 5, 2, true, &device).unwrap();

        assert_eq!(eval.samples, 5);
        let predictions = eval.predictions.unwrap();
        let labels      = eval.labels.unwrap();
        assert_eq!(predictions.len(), 5);
        assert_eq!(labels.len(), 5);
        assert!(eval.mse >= 0.0 && eval.mse.is_finite());

        let recomputed = mean_squared_error(&predictions, &labels).unwrap();
        assert!((recomputed - eval.mse).abs() < 1e-12);
    }

    #[test]
    fn test_streaming_style_discards_predictions() {
        let device = Default::default();
        let model  = SteeringModelConfig::default_architecture().init::<CpuBackend>(&device);
        let mut src = source(3);

        let eval = evaluate(&model, &mut src, 7, 4, false, &device).unwrap();

        assert_eq!(eval.samples, 7);
        assert!(eval.predictions.is_none());
        assert!(eval.labels.is_none());
    }

    #[test]
    fn test_zero_samples_is_an_error() {
        let device = Default::default();
        let model  = SteeringModelConfig::default_architecture().init::<CpuBackend>(&device);
        let mut src = source(3);
        assert!(evaluate(&model, &mut src, 0, 4, true, &device).is_err());
    }
}
