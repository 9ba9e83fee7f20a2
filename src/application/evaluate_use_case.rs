// ============================================================
// Layer 2 — EvaluateUseCase / PredictUseCase
// ============================================================
// Work that only needs a saved model:
//
//   evaluate: model.json + model.mpk + driving log → MSE
//   predict:  model.json + model.mpk + image files → angles

use anyhow::Result;
use burn::prelude::*;
use std::path::PathBuf;

use crate::application::sources::open_source;
use crate::data::prefetch::PrefetchConfig;
use crate::infra::checkpoint::ModelStore;
use crate::ml::{
    evaluator::{evaluate, Evaluation},
    inferencer::Predictor,
};

pub struct EvaluateUseCase {
    pub store:       ModelStore,
    pub logs:        PathBuf,
    pub num_samples: usize,
    pub in_memory:   bool,
    pub batch_size:  usize,
    pub prefetch:    PrefetchConfig,
}

impl EvaluateUseCase {
    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<Evaluation> {
        let (model, _) = self.store.load::<B>(device)?;

        let mut source = open_source(
            &self.logs,
            self.num_samples,
            self.in_memory,
            false,
            0,
            &self.prefetch,
        )?;

        let eval = evaluate(
            &model,
            source.as_mut(),
            self.num_samples,
            self.batch_size,
            self.in_memory,
            device,
        )?;
        tracing::info!("Evaluated '{}': mse={:.6}", self.logs.display(), eval.mse);
        Ok(eval)
    }
}

pub struct PredictUseCase {
    pub store:  ModelStore,
    pub images: Vec<PathBuf>,
}

impl PredictUseCase {
    /// (image path, predicted angle) in input order
    pub fn execute<B: Backend>(&self, device: B::Device) -> Result<Vec<(PathBuf, f32)>> {
        let predictor = Predictor::<B>::from_store(&self.store, device)?;
        let angles    = predictor.predict_paths(&self.images)?;
        Ok(self.images.iter().cloned().zip(angles).collect())
    }
}
