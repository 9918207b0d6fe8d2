//! Networks and agents for meta reinforcement learning implemented with
//! [candle](https://crates.io/crates/candle-core).
//!
//! * [`encoder::MlpEncoder`] - Context encoder inferring the posterior over the
//!   latent task variable of PEARL
//! * [`policy::TanhGaussianPolicy`] - Gaussian policy squashed by tanh
//! * [`gru::GaussianGru`] - Recurrent Gaussian policy of RL²
//! * [`pearl::PearlSac`] - Soft actor-critic agent conditioned on the latent task variable
pub mod encoder;
pub mod gru;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod pearl;
pub mod policy;
pub mod util;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Device {
    /// Uses the GPU of the given index if available, otherwise the CPU.
    pub fn cuda_if_available(ordinal: usize) -> Self {
        match candle_core::utils::cuda_is_available() {
            true => Self::Cuda(ordinal),
            false => Self::Cpu,
        }
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = anyhow::Error;

    fn try_from(device: Device) -> Result<Self> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Activation function of hidden layers.
pub enum Activation {
    /// No activation.
    None,

    /// ReLU.
    ReLU,

    /// Tanh.
    Tanh,
}

impl Default for Activation {
    fn default() -> Self {
        Self::ReLU
    }
}

impl Activation {
    /// Applies the activation function.
    pub fn forward(&self, xs: &candle_core::Tensor) -> candle_core::Result<candle_core::Tensor> {
        match self {
            Self::None => Ok(xs.clone()),
            Self::ReLU => xs.relu(),
            Self::Tanh => xs.tanh(),
        }
    }
}
