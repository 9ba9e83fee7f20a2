// ============================================================
// Layer 3 — DrivingLogRow Domain Type
// ============================================================
// One row of a simulator driving log. The simulator writes
// seven positional columns per timestep:
//
//   center, left, right, steering, throttle, brake, speed
//
// Only the center image path and the steering angle are
// consumed by training; the other columns are kept when the
// row carries them.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Column holding the center camera image path
pub const CENTER_COLUMN: usize = 0;

/// Column holding the steering angle
pub const STEERING_COLUMN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct DrivingLogRow {
    pub center_image: PathBuf,
    pub left_image:   Option<PathBuf>,
    pub right_image:  Option<PathBuf>,
    pub steering:     f32,
    pub throttle:     Option<f32>,
    pub brake:        Option<f32>,
    pub speed:        Option<f32>,
}

impl DrivingLogRow {
    /// Build a row from already-split CSV fields.
    ///
    /// Fails if the row has fewer than four columns or the steering
    /// column is not a float. Trailing columns are optional, but if
    /// present they must parse.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fields: Vec<&str> = fields.into_iter().map(str::trim).collect();

        if fields.len() <= STEERING_COLUMN {
            bail!(
                "expected at least {} columns, found {}",
                STEERING_COLUMN + 1,
                fields.len()
            );
        }

        let center = fields[CENTER_COLUMN];
        if center.is_empty() {
            bail!("center image path is empty");
        }

        let steering: f32 = fields[STEERING_COLUMN]
            .parse()
            .with_context(|| format!("invalid steering angle '{}'", fields[STEERING_COLUMN]))?;

        Ok(Self {
            center_image: PathBuf::from(center),
            left_image:   optional_path(fields.get(1).copied()),
            right_image:  optional_path(fields.get(2).copied()),
            steering,
            throttle:     optional_float(fields.get(4).copied(), "throttle")?,
            brake:        optional_float(fields.get(5).copied(), "brake")?,
            speed:        optional_float(fields.get(6).copied(), "speed")?,
        })
    }

    /// Rows with a zero angle bias the model toward driving straight
    pub fn has_steering(&self) -> bool {
        self.steering != 0.0
    }
}

fn optional_path(field: Option<&str>) -> Option<PathBuf> {
    field.filter(|f| !f.is_empty()).map(PathBuf::from)
}

fn optional_float(field: Option<&str>, name: &str) -> Result<Option<f32>> {
    match field.filter(|f| !f.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .with_context(|| format!("invalid {name} value '{raw}'")),
    }
}
