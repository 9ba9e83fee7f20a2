// ============================================================
// Layer 6 — Metrics
// ============================================================
// Per-epoch training metrics, an optional CSV log of them, and
// the mean squared error used by every evaluation.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: sample-weighted mean MSE over the epoch
//   - samples:    how many samples the epoch consumed
//   - seconds:    wall-clock time of the epoch
//
// Example CSV output:
//   epoch,train_loss,samples,seconds
//   1,0.041230,2000,3.412000
//   2,0.029871,2000,3.107000
//   ...
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean squared error over every training sample of the epoch
    pub train_loss: f64,

    pub samples: usize,

    pub seconds: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, samples: usize, seconds: f64) -> Self {
        Self { epoch, train_loss, samples, seconds }
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs append to the same log.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,train_loss,samples,seconds")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{},{:.6},{},{:.6}", m.epoch, m.train_loss, m.samples, m.seconds)?;

        tracing::debug!("Logged epoch {} metrics: train_loss={:.4}", m.epoch, m.train_loss);
        Ok(())
    }
}

/// Mean of squared differences between predictions and labels.
pub fn mean_squared_error(predictions: &[f32], labels: &[f32]) -> Result<f64> {
    ensure!(
        predictions.len() == labels.len(),
        "length mismatch: {} predictions vs {} labels",
        predictions.len(),
        labels.len()
    );
    ensure!(!labels.is_empty(), "cannot compute MSE over zero samples");

    let sum: f64 = predictions
        .iter()
        .zip(labels)
        .map(|(p, l)| {
            let d = f64::from(*p) - f64::from(*l);
            d * d
        })
        .sum();

    Ok(sum / labels.len() as f64)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mse_known_values() {
        let mse = mean_squared_error(&[0.0, 1.0, 2.0], &[0.0, 0.0, 0.0]).unwrap();
        assert!((mse - 5.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_mse_perfect_prediction_is_zero() {
        let mse = mean_squared_error(&[0.25, -0.5], &[0.25, -0.5]).unwrap();
        assert_eq!(mse, 0.0);
    }

    #[test]
    fn test_mse_rejects_bad_input() {
        assert!(mean_squared_error(&[1.0], &[1.0, 2.0]).is_err());
        assert!(mean_squared_error(&[], &[]).is_err());
    }

    #[test]
    fn test_logger_writes_header_once_and_appends() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("metrics.csv");

        let logger = MetricsLogger::new(&path).unwrap();
        logger.log(&EpochMetrics::new(1, 0.5, 10, 1.25)).unwrap();

        // A second logger on the same file must not repeat the header
        let again = MetricsLogger::new(&path).unwrap();
        again.log(&EpochMetrics::new(2, 0.25, 10, 1.0)).unwrap();

        let text  = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            "epoch,train_loss,samples,seconds",
            "1,0.500000,10,1.250000",
            "2,0.250000,10,1.000000",
        ]);
    }
}
