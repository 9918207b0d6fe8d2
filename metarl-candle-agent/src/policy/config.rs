use crate::mlp::MlpConfig;
use serde::{Deserialize, Serialize};

/// Configuration of [`TanhGaussianPolicy`](super::TanhGaussianPolicy).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TanhGaussianPolicyConfig {
    /// Input dimension, `obs + latent` for PEARL.
    pub in_dim: usize,

    /// Dimension of actions.
    pub out_dim: usize,

    /// Units of hidden layers.
    pub units: Vec<usize>,

    /// Range of the uniform initialization of the output heads.
    pub init_w: f64,
}

impl Default for TanhGaussianPolicyConfig {
    fn default() -> Self {
        Self {
            in_dim: 0,
            out_dim: 0,
            units: vec![300, 300, 300],
            init_w: 1e-3,
        }
    }
}

impl TanhGaussianPolicyConfig {
    /// Creates configuration with the default initialization range `1e-3`.
    pub fn new(in_dim: usize, out_dim: usize, units: Vec<usize>) -> Self {
        Self {
            in_dim,
            out_dim,
            units,
            ..Self::default()
        }
    }

    pub(super) fn mlp_config(&self) -> MlpConfig {
        MlpConfig::new(self.in_dim, self.units.clone(), self.out_dim).init_w(self.init_w)
    }
}
