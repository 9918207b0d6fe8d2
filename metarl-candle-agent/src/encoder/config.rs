//! Configuration of [`MlpEncoder`](super::MlpEncoder).
use crate::{mlp::MlpConfig, opt::OptimizerConfig};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`MlpEncoder`](super::MlpEncoder).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MlpEncoderConfig {
    /// Dimension of a context transition, `obs + act + 1`.
    pub in_dim: usize,

    /// Dimension of the latent task variable.
    pub latent_dim: usize,

    /// Units of hidden layers.
    pub units: Vec<usize>,

    /// Range of the uniform initialization of the output layer.
    pub init_w: f64,

    /// Optimizer of the encoder.
    pub opt_config: OptimizerConfig,
}

impl Default for MlpEncoderConfig {
    fn default() -> Self {
        Self {
            in_dim: 0,
            latent_dim: 5,
            units: vec![300, 300, 300],
            init_w: 3e-3,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl MlpEncoderConfig {
    /// Sets the input dimension from the dimensions of observations and actions.
    pub fn in_dim(mut self, obs_dim: usize, act_dim: usize) -> Self {
        self.in_dim = obs_dim + act_dim + 1;
        self
    }

    /// Sets the dimension of the latent task variable.
    pub fn latent_dim(mut self, v: usize) -> Self {
        self.latent_dim = v;
        self
    }

    /// Sets units of hidden layers.
    pub fn units(mut self, v: Vec<usize>) -> Self {
        self.units = v;
        self
    }

    /// Sets the optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Output dimension of the network, means and variances of `z`.
    pub fn out_dim(&self) -> usize {
        2 * self.latent_dim
    }

    pub(super) fn mlp_config(&self) -> MlpConfig {
        MlpConfig::new(self.in_dim, self.units.clone(), self.out_dim()).init_w(self.init_w)
    }

    /// Constructs [`MlpEncoderConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MlpEncoderConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
