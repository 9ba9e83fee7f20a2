// ============================================================
// Layer 3 — DrivingSample Domain Type
// ============================================================
// One (camera frame, steering angle) training pair.
//
// The image is stored channel-first (CHW) as f32 values in [0, 1]:
//   [ R plane (25x25) | G plane (25x25) | B plane (25x25) ]
// which is the layout Burn's Conv2d expects once a batch
// dimension is stacked in front: [batch, 3, 25, 25].

/// Side length (in pixels) every camera frame is resized to
pub const IMAGE_SIZE: usize = 25;

/// Number of colour channels (RGB)
pub const IMAGE_CHANNELS: usize = 3;

/// Number of f32 values in one resized frame
pub const IMAGE_LEN: usize = IMAGE_CHANNELS * IMAGE_SIZE * IMAGE_SIZE;

/// A decoded, resized camera frame paired with its steering angle.
///
/// Samples are derived on every generator pull and discarded
/// once training or evaluation has consumed them.
#[derive(Debug, Clone, PartialEq)]
pub struct DrivingSample {
    /// CHW pixel values, always exactly IMAGE_LEN long
    pub image: Vec<f32>,

    /// Steering angle — never 0.0, zero-angle rows are filtered out upstream
    pub angle: f32,
}

impl DrivingSample {
    /// Create a sample, checking the image length invariant.
    pub fn new(image: Vec<f32>, angle: f32) -> anyhow::Result<Self> {
        anyhow::ensure!(
            image.len() == IMAGE_LEN,
            "image has {} values, expected {} ({}x{}x{})",
            image.len(),
            IMAGE_LEN,
            IMAGE_SIZE,
            IMAGE_SIZE,
            IMAGE_CHANNELS
        );
        Ok(Self { image, angle })
    }

    /// Shape of the image as (channels, height, width)
    pub fn shape(&self) -> [usize; 3] {
        [IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE]
    }
}
