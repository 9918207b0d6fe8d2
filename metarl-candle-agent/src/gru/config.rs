use serde::{Deserialize, Serialize};

/// Configuration of [`GaussianGru`](super::GaussianGru).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct GaussianGruConfig {
    /// Dimension of an input transition.
    pub in_dim: usize,

    /// Dimension of actions.
    pub out_dim: usize,

    /// Dimension of the hidden state.
    pub hidden_dim: usize,

    /// Initial value of the state-independent log standard deviation.
    pub init_log_std: f64,

    /// Range of the uniform initialization of the mean head.
    pub init_w: f64,
}

impl Default for GaussianGruConfig {
    fn default() -> Self {
        Self {
            in_dim: 0,
            out_dim: 0,
            hidden_dim: 256,
            init_log_std: -0.5,
            init_w: 1e-3,
        }
    }
}

impl GaussianGruConfig {
    /// Creates configuration.
    pub fn new(in_dim: usize, out_dim: usize, hidden_dim: usize) -> Self {
        Self {
            in_dim,
            out_dim,
            hidden_dim,
            ..Self::default()
        }
    }

    /// Sets the initial log standard deviation.
    pub fn init_log_std(mut self, v: f64) -> Self {
        self.init_log_std = v;
        self
    }
}
