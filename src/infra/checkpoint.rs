// ============================================================
// Layer 6 — Model Store
// ============================================================
// Persists a trained model as two artifacts:
//
//   model.json   — architecture description (config + per-layer
//                  summary), pretty-printed JSON
//   model.mpk    — full-precision weights (Burn NamedMpkFileRecorder)
//
// The JSON is what makes the weights loadable: the model has to
// be rebuilt with the exact same architecture before the record
// can be applied to it. Loading fails if the two disagree.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::model::{LayerSummary, SteeringModel, SteeringModelConfig};

pub const DEFAULT_MODEL_JSON: &str = "model.json";
/// The recorder appends its own `.mpk` extension.
pub const DEFAULT_WEIGHTS_STEM: &str = "model";

/// Contents of `model.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescription {
    pub config: SteeringModelConfig,
    pub layers: Vec<LayerSummary>,
}

impl ModelDescription {
    pub fn from_config(config: &SteeringModelConfig) -> Self {
        Self { config: config.clone(), layers: config.describe() }
    }
}

/// Where the two model artifacts live.
#[derive(Debug, Clone)]
pub struct ModelStore {
    json_path:    PathBuf,
    weights_path: PathBuf,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_JSON, DEFAULT_WEIGHTS_STEM)
    }
}

impl ModelStore {
    pub fn new(json_path: impl Into<PathBuf>, weights_path: impl Into<PathBuf>) -> Self {
        Self { json_path: json_path.into(), weights_path: weights_path.into() }
    }

    /// Both artifacts in `dir`, with the default names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(DEFAULT_MODEL_JSON), dir.join(DEFAULT_WEIGHTS_STEM))
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    /// Path of the weights file as written by the recorder.
    pub fn weights_file(&self) -> PathBuf {
        self.weights_path.with_extension("mpk")
    }

    /// Write the architecture JSON and the weights.
    pub fn save<B: Backend>(
        &self,
        model:  &SteeringModel<B>,
        config: &SteeringModelConfig,
    ) -> Result<()> {
        for path in [&self.json_path, &self.weights_path] {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Cannot create '{}'", dir.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(&ModelDescription::from_config(config))?;
        fs::write(&self.json_path, json)
            .with_context(|| format!("Cannot write '{}'", self.json_path.display()))?;

        NamedMpkFileRecorder::<FullPrecisionSettings>::new()
            .record(model.clone().into_record(), self.weights_path.clone())
            .with_context(|| {
                format!("Failed to save weights to '{}'", self.weights_file().display())
            })?;

        tracing::info!(
            "Saved model to '{}' and '{}'",
            self.json_path.display(),
            self.weights_file().display()
        );
        Ok(())
    }

    pub fn load_description(&self) -> Result<ModelDescription> {
        let json = fs::read_to_string(&self.json_path).with_context(|| {
            format!(
                "Cannot read '{}'. Have you trained the model first?",
                self.json_path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed model description '{}'", self.json_path.display()))
    }

    /// Rebuild the architecture from JSON, then restore the weights into it.
    pub fn load<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(SteeringModel<B>, SteeringModelConfig)> {
        let description = self.load_description()?;
        description.config.validate()?;

        let model: SteeringModel<B> = description.config.init(device);

        let record = NamedMpkFileRecorder::<FullPrecisionSettings>::new()
            .load(self.weights_path.clone(), device)
            .with_context(|| {
                format!("Cannot load weights '{}'", self.weights_file().display())
            })?;

        tracing::info!("Loaded model from '{}'", self.weights_file().display());
        Ok((model.load_record(record), description.config))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::IMAGE_LEN;
    use crate::ml::backend::CpuBackend;

    fn probe(device: &<CpuBackend as Backend>::Device) -> Tensor<CpuBackend, 4> {
        let pixels: Vec<f32> = (0..2 * IMAGE_LEN).map(|i| (i % 29) as f32 / 29.0).collect();
        Tensor::from_floats(TensorData::new(pixels, [2, 3, 25, 25]), device)
    }

    #[test]
    fn test_round_trip_gives_identical_predictions() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = ModelStore::in_dir(dir.path());
        let device = Default::default();

        let config = SteeringModelConfig::default_architecture();
        let model  = config.init::<CpuBackend>(&device);
        let before = model.forward(probe(&device)).into_data().to_vec::<f32>().unwrap();

        store.save(&model, &config).unwrap();
        assert!(store.json_path().exists());
        assert!(store.weights_file().exists());

        let (loaded, loaded_cfg) = store.load::<CpuBackend>(&device).unwrap();
        let after = loaded.forward(probe(&device)).into_data().to_vec::<f32>().unwrap();

        assert_eq!(before, after);
        assert_eq!(loaded_cfg.conv_kernels, config.conv_kernels);
        assert_eq!(loaded_cfg.fc_nodes, config.fc_nodes);
    }

    #[test]
    fn test_description_lists_layers() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::in_dir(dir.path());
        let config = SteeringModelConfig::default_architecture();
        let model  = config.init::<CpuBackend>(&Default::default());
        store.save(&model, &config).unwrap();

        let description = store.load_description().unwrap();
        assert_eq!(description.layers, config.describe());
        assert_eq!(description.config.dropout, config.dropout);
    }

    #[test]
    fn test_load_without_artifacts_fails() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::in_dir(dir.path());
        assert!(store.load::<CpuBackend>(&Default::default()).is_err());
    }
}
