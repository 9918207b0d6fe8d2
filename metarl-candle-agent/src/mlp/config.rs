use crate::Activation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Mlp`](super::Mlp).
pub struct MlpConfig {
    pub(super) in_dim: usize,
    pub(super) units: Vec<usize>,
    pub(super) out_dim: usize,
    #[serde(default)]
    pub(super) activation: Activation,
    #[serde(default)]
    pub(super) init_w: Option<f64>,
}

impl MlpConfig {
    /// Creates configuration of MLP with ReLU activation in hidden layers.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            activation: Activation::ReLU,
            init_w: None,
        }
    }

    /// Sets the activation function of hidden layers.
    pub fn activation(mut self, v: Activation) -> Self {
        self.activation = v;
        self
    }

    /// Initializes the weights and biases of the output layer uniformly in `[-v, v]`.
    pub fn init_w(mut self, v: f64) -> Self {
        self.init_w = Some(v);
        self
    }

    /// Input dimension.
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    /// Output dimension.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }
}
