// ============================================================
// Layer 4 — Driving Log Loader
// ============================================================
// Reads simulator driving logs and decodes the camera frames
// they point at.
//
// LogCursor is the read position inside a log. It owns the CSV
// reader and, when it hits end-of-file, reopens the file and
// starts again from the first row. Downstream consumers pull a
// fixed number of samples per epoch which is usually more than
// one pass through the log, so the cursor never runs dry.
//
// Zero-angle rows are skipped here, before any image is decoded.
//
// Log format (no header, whitespace around fields allowed):
//   IMG/center_2016_12_01.jpg, IMG/left_....jpg, IMG/right_....jpg, -0.05, 0.9, 0, 30.1
//
// Reference: csv crate documentation (ReaderBuilder)
//            image crate documentation (ImageReader, FilterType)

use anyhow::{bail, Context, Result};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use image::{imageops::FilterType, ImageReader};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::domain::driving_log::DrivingLogRow;
use crate::domain::sample::{DrivingSample, IMAGE_LEN, IMAGE_SIZE};

/// Cyclic cursor over the non-zero-angle rows of one driving log.
pub struct LogCursor {
    /// Path of the log file (reopened on every cycle)
    path: PathBuf,

    /// Directory relative image paths fall back to
    base_dir: PathBuf,

    reader: Reader<File>,

    /// Reused record buffer — avoids one allocation per row
    record: StringRecord,

    /// 1-based number of the last row read in the current cycle
    line: u64,

    /// Rows handed out since the file was last (re)opened
    yielded_in_cycle: usize,

    /// Completed passes over the file
    cycles: u64,
}

impl LogCursor {
    /// Open a driving log. A missing file is an error right away.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path   = path.as_ref().to_path_buf();
        let reader = open_reader(&path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        tracing::debug!("Opened driving log '{}'", path.display());

        Ok(Self {
            path,
            base_dir,
            reader,
            record: StringRecord::new(),
            line: 0,
            yielded_in_cycle: 0,
            cycles: 0,
        })
    }

    /// Path of the underlying log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of completed passes over the log
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Return the next row with a non-zero steering angle,
    /// wrapping around to the first row at end-of-file.
    pub fn next_row(&mut self) -> Result<DrivingLogRow> {
        loop {
            let has_record = self
                .reader
                .read_record(&mut self.record)
                .with_context(|| {
                    format!("Cannot read '{}' after row {}", self.path.display(), self.line)
                })?;

            if !has_record {
                // A whole pass without a usable row would loop forever
                if self.yielded_in_cycle == 0 {
                    bail!(
                        "Driving log '{}' has no rows with a non-zero steering angle",
                        self.path.display()
                    );
                }
                self.rewind()?;
                continue;
            }

            self.line += 1;
            let row = DrivingLogRow::from_fields(self.record.iter()).with_context(|| {
                format!("Malformed row {} in '{}'", self.line, self.path.display())
            })?;

            if !row.has_steering() {
                continue;
            }

            self.yielded_in_cycle += 1;
            return Ok(self.resolve(row));
        }
    }

    /// Reopen the file and start again from the first row
    fn rewind(&mut self) -> Result<()> {
        self.reader = open_reader(&self.path)?;
        self.cycles += 1;
        tracing::debug!(
            "Driving log '{}' exhausted after {} samples, restarting (cycle {})",
            self.path.display(),
            self.yielded_in_cycle,
            self.cycles
        );
        self.line = 0;
        self.yielded_in_cycle = 0;
        Ok(())
    }

    /// Relative image paths are tried as-is first, then against the log's directory
    fn resolve(&self, mut row: DrivingLogRow) -> DrivingLogRow {
        if row.center_image.is_relative() && !row.center_image.exists() {
            let candidate = self.base_dir.join(&row.center_image);
            if candidate.exists() {
                row.center_image = candidate;
            }
        }
        row
    }
}

fn open_reader(path: &Path) -> Result<Reader<File>> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("Cannot open driving log '{}'", path.display()))
}

/// Decode an image and resize it to IMAGE_SIZE x IMAGE_SIZE RGB.
///
/// Returns CHW f32 values scaled to [0, 1]. Any source resolution
/// or colour type is accepted; alpha is dropped, grey is expanded.
pub fn load_image(path: &Path) -> Result<Vec<f32>> {
    let img = ImageReader::open(path)
        .with_context(|| format!("Cannot open image '{}'", path.display()))?
        .decode()
        .with_context(|| format!("Cannot decode image '{}'", path.display()))?
        .resize_exact(IMAGE_SIZE as u32, IMAGE_SIZE as u32, FilterType::Triangle)
        .to_rgb8();

    let plane = IMAGE_SIZE * IMAGE_SIZE;
    let mut image = vec![0.0f32; IMAGE_LEN];

    for (x, y, pixel) in img.enumerate_pixels() {
        let idx = y as usize * IMAGE_SIZE + x as usize;
        image[idx]             = pixel[0] as f32 / 255.0;
        image[plane + idx]     = pixel[1] as f32 / 255.0;
        image[2 * plane + idx] = pixel[2] as f32 / 255.0;
    }

    Ok(image)
}

/// Decode the center image of a row into a training sample
pub fn load_sample(row: &DrivingLogRow) -> Result<DrivingSample> {
    let image = load_image(&row.center_image)?;
    DrivingSample::new(image, row.steering)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{write_frame, write_log};
    use tempfile::tempdir;

    #[test]
    fn test_zero_angles_are_skipped() {
        let dir  = tempdir().unwrap();
        let log  = write_log(dir.path(), &[0.0, 0.2, -0.1]);
        let mut cursor = LogCursor::open(&log).unwrap();

        assert_eq!(cursor.next_row().unwrap().steering, 0.2);
        assert_eq!(cursor.next_row().unwrap().steering, -0.1);
    }

    #[test]
    fn test_wraps_around_to_first_row() {
        let dir  = tempdir().unwrap();
        let log  = write_log(dir.path(), &[0.0, 0.2, -0.1]);
        let mut cursor = LogCursor::open(&log).unwrap();

        let angles: Vec<f32> = (0..5).map(|_| cursor.next_row().unwrap().steering).collect();
        assert_eq!(angles, vec![0.2, -0.1, 0.2, -0.1, 0.2]);
        assert_eq!(cursor.cycles(), 2);
    }

    #[test]
    fn test_all_zero_log_fails_instead_of_spinning() {
        let dir = tempdir().unwrap();
        let log = write_log(dir.path(), &[0.0, 0.0]);
        let mut cursor = LogCursor::open(&log).unwrap();
        assert!(cursor.next_row().is_err());
    }

    #[test]
    fn test_missing_log_fails_on_open() {
        let dir = tempdir().unwrap();
        assert!(LogCursor::open(dir.path().join("nope.csv")).is_err());
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("bad.csv");
        std::fs::write(&log, "a.png, b.png, c.png, 0.1\na.png, b.png\n").unwrap();
        let mut cursor = LogCursor::open(&log).unwrap();

        assert!(cursor.next_row().is_ok());
        let err = cursor.next_row().unwrap_err();
        assert!(format!("{err:#}").contains("row 2"));
    }

    #[test]
    fn test_relative_paths_resolve_against_log_dir() {
        let dir = tempdir().unwrap();
        let log = write_log(dir.path(), &[0.3]);
        let mut cursor = LogCursor::open(&log).unwrap();
        let row = cursor.next_row().unwrap();
        assert!(row.center_image.exists());
    }

    #[test]
    fn test_any_resolution_resizes_to_25x25x3() {
        let dir = tempdir().unwrap();
        for (w, h) in [(320, 160), (10, 40), (25, 25)] {
            let path = write_frame(dir.path(), &format!("f_{w}x{h}.png"), w, h);
            let image = load_image(&path).unwrap();
            assert_eq!(image.len(), 3 * 25 * 25);
            assert!(image.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_unreadable_image_names_path() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = load_image(&path).unwrap_err();
        assert!(err.to_string().contains("broken.png"));
    }
}
