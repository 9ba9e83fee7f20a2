// ============================================================
// Layer 4 — Steering Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<DrivingSample>
// into device tensors.
//
//   Input:  N samples, each a CHW Vec<f32> of 3*25*25 values
//   Output: images  [N, 3, 25, 25]
//           targets [N, 1]
//
// The images are already CHW, so stacking is just concatenating
// the flat vectors in order and giving the result its 4D shape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::{DrivingSample, IMAGE_CHANNELS, IMAGE_SIZE};

/// A batch of samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct SteeringBatch<B: Backend> {
    /// Camera frames — shape: [batch_size, 3, 25, 25]
    pub images: Tensor<B, 4>,

    /// Steering angles — shape: [batch_size, 1]
    pub targets: Tensor<B, 2>,
}

impl<B: Backend> SteeringBatch<B> {
    pub fn len(&self) -> usize {
        self.images.dims()[0]
    }
}

/// Holds the target device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct SteeringBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SteeringBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<DrivingSample, SteeringBatch<B>> for SteeringBatcher<B> {
    fn batch(&self, items: Vec<DrivingSample>) -> SteeringBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.image.iter().copied())
            .collect();

        let angles: Vec<f32> = items.iter().map(|s| s.angle).collect();

        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(pixels, [batch_size, IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE]),
            &self.device,
        );

        let targets = Tensor::<B, 2>::from_floats(
            TensorData::new(angles, [batch_size, 1]),
            &self.device,
        );

        SteeringBatch { images, targets }
    }
}
