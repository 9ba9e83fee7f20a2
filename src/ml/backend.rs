//! Backend aliases.
//!
//! Training runs on `Autodiff<Wgpu>` by default. `NdArray` is the CPU
//! fallback for machines without a usable GPU adapter and is what the
//! unit tests use.

use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};

pub type GpuBackend      = Wgpu;
pub type GpuTrainBackend = Autodiff<GpuBackend>;

pub type CpuBackend      = NdArray;
pub type CpuTrainBackend = Autodiff<CpuBackend>;

pub fn gpu_device() -> WgpuDevice {
    WgpuDevice::default()
}

pub fn cpu_device() -> NdArrayDevice {
    NdArrayDevice::default()
}
