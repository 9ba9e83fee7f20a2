// ============================================================
// Layer 5 — Steering Model
// ============================================================
// A small CNN regressor: camera frame in, steering angle out.
//
//   Input  [N, 3, 25, 25]
//     │
//     ▼  BatchNorm over the 3 channels
//     ▼  per conv layer: same-padded Conv2d → ReLU → MaxPool 2x2
//     ▼  flatten → dropout
//     ▼  per dense layer: Linear → ReLU → dropout
//     ▼  Linear(1), no activation
//   Output [N, 1]
//
// With the default architecture the feature map goes
// 25 → 12 → 6, so 16 * 6 * 6 = 576 features reach the dense layer.
//
// Reference: Burn Book §3 (Building Blocks)

use anyhow::{ensure, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::{MseLoss, Reduction},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};
use serde::{Deserialize, Serialize};

/// Pooling window and stride used after every convolution
const POOL: usize = 2;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SteeringModelConfig {
    /// Kernel count of each convolutional layer
    pub conv_kernels: Vec<usize>,
    /// [height, width] of each convolutional layer's kernels
    pub kernel_dims:  Vec<[usize; 2]>,
    /// Node count of each fully-connected layer
    pub fc_nodes:     Vec<usize>,
    /// Dropout rate shared by every dropout site
    #[config(default = "0.3")]
    pub dropout:      f64,
    #[config(default = "25")]
    pub image_size:   usize,
    #[config(default = "3")]
    pub channels:     usize,
}

/// One row of the architecture summary written to model.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub name:         String,
    /// Output shape without the batch dimension
    pub output_shape: Vec<usize>,
    /// Trainable parameters
    pub params:       usize,
}

impl SteeringModelConfig {
    /// 2 conv layers (8 and 16 kernels, 4x4), 1 dense layer of 32 nodes, dropout 0.3
    pub fn default_architecture() -> Self {
        Self::new(vec![8, 16], vec![[4, 4], [4, 4]], vec![32])
    }

    /// Build a config from explicit layer counts, checking they agree
    /// with the per-layer lists.
    pub fn from_layers(
        num_conv_layers: usize,
        conv_kernels:    Vec<usize>,
        kernel_dims:     Vec<[usize; 2]>,
        num_fc_layers:   usize,
        fc_nodes:        Vec<usize>,
        dropout:         f64,
    ) -> Result<Self> {
        ensure!(
            conv_kernels.len() == num_conv_layers && kernel_dims.len() == num_conv_layers,
            "{} conv layers requested but got {} kernel counts and {} kernel sizes",
            num_conv_layers, conv_kernels.len(), kernel_dims.len()
        );
        ensure!(
            fc_nodes.len() == num_fc_layers,
            "{} fully-connected layers requested but got {} node counts",
            num_fc_layers, fc_nodes.len()
        );

        let config = Self::new(conv_kernels, kernel_dims, fc_nodes).with_dropout(dropout);
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that would panic inside Burn or collapse the feature map
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.conv_kernels.len() == self.kernel_dims.len(),
            "conv_kernels and kernel_dims differ in length"
        );
        ensure!(self.conv_kernels.iter().all(|&k| k > 0), "kernel counts must be positive");
        ensure!(
            self.kernel_dims.iter().all(|&[h, w]| h > 0 && w > 0),
            "kernel sizes must be positive"
        );
        ensure!(self.fc_nodes.iter().all(|&n| n > 0), "node counts must be positive");
        ensure!(
            (0.0..1.0).contains(&self.dropout),
            "dropout must be in [0, 1), got {}",
            self.dropout
        );
        ensure!(self.channels > 0 && self.image_size > 0, "input shape must be positive");

        let mut size = self.image_size;
        for layer in 0..self.conv_kernels.len() {
            ensure!(
                size >= POOL,
                "feature map is {size}x{size} before pooling layer {}, too small to pool",
                layer + 1
            );
            size /= POOL;
        }
        Ok(())
    }

    /// Side length of the feature map after all conv + pool blocks
    pub fn feature_map_size(&self) -> usize {
        self.conv_kernels
            .iter()
            .fold(self.image_size, |size, _| size / POOL)
    }

    /// Number of features entering the first dense layer
    pub fn flattened_len(&self) -> usize {
        let channels = self.conv_kernels.last().copied().unwrap_or(self.channels);
        let size = self.feature_map_size();
        channels * size * size
    }

    /// Layer-by-layer summary, in forward order
    pub fn describe(&self) -> Vec<LayerSummary> {
        let layer = |name: String, output_shape: Vec<usize>, params: usize| LayerSummary {
            name, output_shape, params,
        };

        let mut layers = vec![layer(
            "batch_norm".into(),
            vec![self.channels, self.image_size, self.image_size],
            2 * self.channels,
        )];

        let mut channels = self.channels;
        let mut size     = self.image_size;
        for (i, (&kernels, &[kh, kw])) in self.conv_kernels.iter().zip(&self.kernel_dims).enumerate() {
            layers.push(layer(
                format!("conv2d_{}", i + 1),
                vec![kernels, size, size],
                kernels * channels * kh * kw + kernels,
            ));
            size /= POOL;
            layers.push(layer(format!("max_pool_{}", i + 1), vec![kernels, size, size], 0));
            channels = kernels;
        }

        let mut features = self.flattened_len();
        layers.push(layer("flatten".into(), vec![features], 0));
        layers.push(layer("dropout".into(), vec![features], 0));

        for (i, &nodes) in self.fc_nodes.iter().enumerate() {
            layers.push(layer(format!("dense_{}", i + 1), vec![nodes], features * nodes + nodes));
            layers.push(layer(format!("dropout_{}", i + 1), vec![nodes], 0));
            features = nodes;
        }

        layers.push(layer("output".into(), vec![1], features + 1));
        layers
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> SteeringModel<B> {
        let norm = BatchNormConfig::new(self.channels).init(device);

        let mut conv_blocks = Vec::with_capacity(self.conv_kernels.len());
        let mut in_channels = self.channels;
        for (&kernels, &kernel) in self.conv_kernels.iter().zip(&self.kernel_dims) {
            conv_blocks.push(ConvBlock::new(in_channels, kernels, kernel, device));
            in_channels = kernels;
        }

        let mut dense_layers = Vec::with_capacity(self.fc_nodes.len());
        let mut features = self.flattened_len();
        for &nodes in &self.fc_nodes {
            dense_layers.push(LinearConfig::new(features, nodes).init(device));
            features = nodes;
        }

        SteeringModel {
            norm,
            conv_blocks,
            dense_layers,
            dropout: DropoutConfig::new(self.dropout).init(),
            output:  LinearConfig::new(features, 1).init(device),
        }
    }
}

/// Convolution with "same" output size, ReLU, then 2x2 max pooling.
///
/// Burn's built-in same padding only handles odd kernels, so the input
/// is zero-padded explicitly: the extra row/column of an even kernel
/// goes on the bottom/right.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv:       Conv2d<B>,
    pub pool:       MaxPool2d,
    pub pad_top:    usize,
    pub pad_bottom: usize,
    pub pad_left:   usize,
    pub pad_right:  usize,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(in_channels: usize, kernels: usize, [kh, kw]: [usize; 2], device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, kernels], [kh, kw]).init(device);
        let pool = MaxPool2dConfig::new([POOL, POOL]).with_strides([POOL, POOL]).init();
        Self {
            conv,
            pool,
            pad_top:    (kh - 1) / 2,
            pad_bottom: kh - 1 - (kh - 1) / 2,
            pad_left:   (kw - 1) / 2,
            pad_right:  kw - 1 - (kw - 1) / 2,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(self.pad_same(x));
        self.pool.forward(relu(x))
    }

    fn pad_same(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        if self.pad_top + self.pad_bottom + self.pad_left + self.pad_right == 0 {
            return x;
        }
        let [n, c, h, w] = x.dims();
        let padded = Tensor::zeros(
            [n, c, h + self.pad_top + self.pad_bottom, w + self.pad_left + self.pad_right],
            &x.device(),
        );
        padded.slice_assign(
            [0..n, 0..c, self.pad_top..self.pad_top + h, self.pad_left..self.pad_left + w],
            x,
        )
    }
}

#[derive(Module, Debug)]
pub struct SteeringModel<B: Backend> {
    pub norm:         BatchNorm<B, 2>,
    pub conv_blocks:  Vec<ConvBlock<B>>,
    pub dense_layers: Vec<Linear<B>>,
    pub dropout:      Dropout,
    pub output:       Linear<B>,
}

impl<B: Backend> SteeringModel<B> {
    /// images: [batch, 3, 25, 25] → raw steering angle [batch, 1]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = self.norm.forward(images);
        for block in &self.conv_blocks {
            x = block.forward(x);
        }

        let mut x = self.dropout.forward(x.flatten::<2>(1, 3));
        for dense in &self.dense_layers {
            x = self.dropout.forward(relu(dense.forward(x)));
        }

        // No activation on the read-out: plain regression output
        self.output.forward(x)
    }

    /// Forward pass plus mean squared error against `targets` ([batch, 1])
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let output = self.forward(images);
        let loss = MseLoss::new().forward(output.clone(), targets, Reduction::Mean);
        (loss, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_output_is_one_scalar_per_sample() {
        let device = Default::default();
        let model  = SteeringModelConfig::default_architecture().init::<TestBackend>(&device);

        for batch in [1, 3, 32] {
            let input  = Tensor::<TestBackend, 4>::ones([batch, 3, 25, 25], &device);
            assert_eq!(model.forward(input).dims(), [batch, 1]);
        }
    }

    #[test]
    fn test_even_kernel_keeps_spatial_size() {
        let device = Default::default();
        let block  = ConvBlock::<TestBackend>::new(3, 8, [4, 4], &device);
        let input  = Tensor::<TestBackend, 4>::zeros([2, 3, 25, 25], &device);
        // 25 → same conv → 25 → pool → 12
        assert_eq!(block.forward(input).dims(), [2, 8, 12, 12]);
        assert_eq!((block.pad_top, block.pad_bottom), (1, 2));
    }

    #[test]
    fn test_default_architecture_summary() {
        let cfg = SteeringModelConfig::default_architecture();
        assert_eq!(cfg.feature_map_size(), 6);
        assert_eq!(cfg.flattened_len(), 576);

        let layers = cfg.describe();
        let names: Vec<&str> = layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "batch_norm", "conv2d_1", "max_pool_1", "conv2d_2", "max_pool_2",
                "flatten", "dropout", "dense_1", "dropout_1", "output",
            ]
        );
        assert_eq!(layers[1].params, 8 * 3 * 16 + 8);
        assert_eq!(layers[7].params, 576 * 32 + 32);
        assert_eq!(layers.last().unwrap().output_shape, vec![1]);
    }

    #[test]
    fn test_from_layers_checks_counts() {
        assert!(SteeringModelConfig::from_layers(2, vec![8], vec![[4, 4]], 1, vec![32], 0.3).is_err());
        assert!(SteeringModelConfig::from_layers(1, vec![8], vec![[4, 4]], 2, vec![32], 0.3).is_err());
        assert!(SteeringModelConfig::from_layers(1, vec![8], vec![[4, 4]], 1, vec![32], 1.0).is_err());

        let cfg = SteeringModelConfig::from_layers(2, vec![8, 16], vec![[4, 4], [4, 4]], 1, vec![32], 0.3)
            .unwrap();
        assert_eq!(cfg.flattened_len(), 576);
    }

    #[test]
    fn test_too_many_pools_rejected() {
        let cfg = SteeringModelConfig::new(vec![4; 5], vec![[3, 3]; 5], vec![]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_loss_is_scalar() {
        let device  = Default::default();
        let model   = SteeringModelConfig::default_architecture().init::<TestBackend>(&device);
        let images  = Tensor::<TestBackend, 4>::zeros([4, 3, 25, 25], &device);
        let targets = Tensor::<TestBackend, 2>::ones([4, 1], &device);
        let (loss, output) = model.forward_loss(images, targets);
        assert_eq!(loss.dims(), [1]);
        assert_eq!(output.dims(), [4, 1]);
    }
}
