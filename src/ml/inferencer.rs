// ============================================================
// Layer 5 — Predictor
// ============================================================
// Loads a saved model (model.json + model.mpk) and predicts
// steering angles for camera frames on disk.
use anyhow::{Context, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use std::path::PathBuf;

use crate::data::batcher::SteeringBatcher;
use crate::data::loader::load_image;
use crate::domain::sample::DrivingSample;
use crate::infra::checkpoint::ModelStore;
use crate::ml::model::SteeringModel;

const PREDICT_BATCH: usize = 32;

pub struct Predictor<B: Backend> {
    model:  SteeringModel<B>,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    pub fn new(model: SteeringModel<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    pub fn from_store(store: &ModelStore, device: B::Device) -> Result<Self> {
        let (model, _) = store.load::<B>(&device)?;
        tracing::info!("Model loaded from '{}'", store.json_path().display());
        Ok(Self { model, device })
    }

    /// One predicted angle per image, in input order.
    pub fn predict_paths(&self, paths: &[PathBuf]) -> Result<Vec<f32>> {
        let mut angles = Vec::with_capacity(paths.len());

        for chunk in paths.chunks(PREDICT_BATCH) {
            let images = chunk
                .iter()
                .map(|p| load_image(p))
                .collect::<Result<Vec<_>>>()?;
            angles.extend(self.predict_images(images)?);
        }

        Ok(angles)
    }

    /// Predict from already-decoded CHW frames.
    pub fn predict_images(&self, images: Vec<Vec<f32>>) -> Result<Vec<f32>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        // The label is unused at inference
        let items = images
            .into_iter()
            .map(|image| DrivingSample::new(image, 0.0))
            .collect::<Result<Vec<_>>>()?;

        let batch = SteeringBatcher::<B>::new(self.device.clone()).batch(items);
        let angles = self
            .model
            .forward(batch.images)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("{e:?}"))
            .context("Cannot read predictions")?;

        tracing::debug!("Predicted {} angles", angles.len());
        Ok(angles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::write_frame;
    use crate::ml::backend::CpuBackend;
    use crate::ml::model::SteeringModelConfig;

    #[test]
    fn test_predicts_one_angle_per_path_and_matches_saved_model() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let config = SteeringModelConfig::default_architecture();
        let model  = config.init::<CpuBackend>(&device);

        let store = ModelStore::in_dir(dir.path());
        store.save(&model, &config).unwrap();

        let paths: Vec<PathBuf> = (0..3)
            .map(|i| write_frame(dir.path(), &format!("frame_{i}.png"), 50 + i, 30))
            .collect();

        let loaded   = Predictor::<CpuBackend>::from_store(&store, device).unwrap();
        let direct   = Predictor::<CpuBackend>::new(model, device);
        let from_disk = loaded.predict_paths(&paths).unwrap();

        assert_eq!(from_disk.len(), 3);
        assert_eq!(from_disk, direct.predict_paths(&paths).unwrap());
    }

    #[test]
    fn test_missing_image_fails() {
        let device = Default::default();
        let model  = SteeringModelConfig::default_architecture().init::<CpuBackend>(&device);
        let predictor = Predictor::<CpuBackend>::new(model, device);
        assert!(predictor.predict_paths(&[PathBuf::from("/no/such/frame.png")]).is_err());
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let device = Default::default();
        let model  = SteeringModelConfig::default_architecture().init::<CpuBackend>(&device);
        let predictor = Predictor::<CpuBackend>::new(model, device);
        assert!(predictor.predict_images(Vec::new()).unwrap().is_empty());
    }
}
