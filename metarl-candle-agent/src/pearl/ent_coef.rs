//! Entropy coefficient of SAC.
use crate::opt::{Optimizer, OptimizerConfig};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{init::Init, VarBuilder, VarMap};
use log::trace;
use serde::{Deserialize, Serialize};

/// Mode of the entropy coefficient of SAC.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum EntCoefMode {
    /// Use a constant as alpha.
    Fix(f64),

    /// Automatic tuning starting from `alpha = 1`.
    Auto {
        /// Target entropy, `-action_dim` if not given.
        target_entropy: Option<f64>,

        /// Learning rate.
        lr: f64,
    },
}

impl Default for EntCoefMode {
    fn default() -> Self {
        Self::Auto {
            target_entropy: None,
            lr: 3e-4,
        }
    }
}

/// The entropy coefficient of SAC.
pub struct EntCoef {
    log_alpha: Tensor,
    target_entropy: Option<f64>,
    opt: Option<Optimizer>,
}

impl EntCoef {
    /// Constructs an instance of `EntCoef`.
    pub fn new(mode: EntCoefMode, action_dim: usize, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let (log_alpha, target_entropy, opt) = match mode {
            EntCoefMode::Fix(alpha) => {
                let init = Init::Const(alpha.ln());
                let log_alpha = vb.get_with_hints(1, "log_alpha", init)?;
                (log_alpha, None, None)
            }
            EntCoefMode::Auto { target_entropy, lr } => {
                let init = Init::Const(0.0);
                let log_alpha = vb.get_with_hints(1, "log_alpha", init)?;
                let opt = OptimizerConfig::Adam { lr }.build(varmap.all_vars())?;
                let target_entropy = target_entropy.unwrap_or(-(action_dim as f64));
                (log_alpha, Some(target_entropy), Some(opt))
            }
        };

        Ok(Self {
            log_alpha,
            opt,
            target_entropy,
        })
    }

    /// Returns the entropy coefficient, shape `(1,)`.
    pub fn alpha(&self) -> Result<Tensor> {
        Ok(self.log_alpha.detach().exp()?)
    }

    /// Target entropy, `None` for a fixed coefficient.
    pub fn target_entropy(&self) -> Option<f64> {
        self.target_entropy
    }

    /// Updates the coefficient given log probabilities of sampled actions.
    ///
    /// Returns the loss if the coefficient is tuned.
    pub fn update(&mut self, log_prob: &Tensor) -> Result<Option<f32>> {
        let (target_entropy, opt) = match (self.target_entropy, &mut self.opt) {
            (Some(target_entropy), Some(opt)) => (target_entropy, opt),
            _ => return Ok(None),
        };
        let loss = {
            let tmp = (log_prob + target_entropy)?.detach();
            (self.log_alpha.broadcast_mul(&tmp)? * -1f64)?.mean_all()?
        };
        opt.backward_step(&loss)?;
        trace!("log_alpha = {:?}", self.log_alpha.to_vec1::<f32>()?);

        Ok(Some(loss.to_scalar::<f32>()?))
    }
}
