//! Optimizers.
use anyhow::Result;
use candle_core::{backprop::GradStore, Tensor, Var};
use candle_nn::Optimizer as _;
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Configuration of the optimizer of a network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam with default moment coefficients.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

impl OptimizerConfig {
    /// Constructs an optimizer for the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match self {
            Self::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                Ok(Optimizer::Adam(Adam::new(vars, params)?))
            }
        }
    }

    /// Replaces the learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::Adam { .. } => Self::Adam { lr },
        }
    }

    /// The learning rate.
    pub fn lr(&self) -> f64 {
        match self {
            Self::Adam { lr } => *lr,
        }
    }
}

impl Default for OptimizerConfig {
    /// Adam with learning rate `3e-4`.
    fn default() -> Self {
        Self::Adam { lr: 3e-4 }
    }
}

/// Optimizer built from [`OptimizerConfig`].
pub enum Optimizer {
    /// Adam from [`candle_optimisers`].
    Adam(Adam),
}

impl Optimizer {
    /// Computes gradients of `loss` and updates the variables.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
        }
    }

    /// Updates the variables with gradients computed beforehand.
    ///
    /// Gradients of variables not owned by the optimizer are ignored, so that a
    /// single backward pass can update several networks.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        match self {
            Self::Adam(opt) => Ok(opt.step(grads)?),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn test_learning_rate() {
        let config = OptimizerConfig::default().learning_rate(1e-3);
        assert_eq!(config, OptimizerConfig::Adam { lr: 1e-3 });
        assert_eq!(config.lr(), 1e-3);
    }

    #[test]
    fn test_step_ignores_foreign_vars() -> Result<()> {
        let owned = Var::ones(2, DType::F32, &Device::Cpu)?;
        let foreign = Var::ones(2, DType::F32, &Device::Cpu)?;
        let mut opt = OptimizerConfig::Adam { lr: 0.1 }.build(vec![owned.clone()])?;

        let loss = (owned.as_tensor() + foreign.as_tensor())?.sum_all()?;
        let grads = loss.backward()?;
        opt.step(&grads)?;

        assert!(owned.as_tensor().sum_all()?.to_scalar::<f32>()? < 2.0);
        assert_eq!(foreign.as_tensor().sum_all()?.to_scalar::<f32>()?, 2.0);
        Ok(())
    }
}
