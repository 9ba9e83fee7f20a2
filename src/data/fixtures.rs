// Test-only helpers that write small driving logs and PNG frames
// into a scratch directory.

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// Write a solid-colour-ish PNG of the given size and return its path
pub fn write_frame(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save(&path).unwrap();
    path
}

/// Write one frame per angle plus a headerless simulator log that
/// references the frames by relative path. Returns the log path.
pub fn write_log(dir: &Path, angles: &[f32]) -> PathBuf {
    write_named_log(dir, "driving_log.csv", angles)
}

pub fn write_named_log(dir: &Path, log_name: &str, angles: &[f32]) -> PathBuf {
    let mut lines = String::new();
    for (i, angle) in angles.iter().enumerate() {
        let name = format!("{}_center_{i}.png", log_name.trim_end_matches(".csv"));
        // Vary the source resolution so resizing is always exercised
        write_frame(dir, &name, 40 + i as u32 * 3, 20 + i as u32 * 2);
        lines.push_str(&format!(
            "{name}, left_{i}.png, right_{i}.png, {angle}, 0.5, 0, 22.3\n"
        ));
    }
    let log = dir.join(log_name);
    std::fs::write(&log, lines).unwrap();
    log
}
