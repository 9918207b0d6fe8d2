//! Actor of PEARL.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    policy::{TanhGaussianPolicy, TanhGaussianPolicyConfig},
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};

/// Tanh-Gaussian policy `π(a | obs, z)` with its optimizer.
pub struct Actor {
    varmap: VarMap,
    pi: TanhGaussianPolicy,
    opt: Optimizer,
}

impl Actor {
    /// Constructs [`Actor`].
    pub fn build(
        pi_config: TanhGaussianPolicyConfig,
        opt_config: &OptimizerConfig,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let pi = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
            TanhGaussianPolicy::build(vb.pp("pi"), pi_config)?
        };
        let opt = opt_config.build(varmap.all_vars())?;

        Ok(Self { varmap, pi, opt })
    }

    /// Actions and, for the stochastic policy, their log probabilities.
    pub fn forward(&self, obs: &Tensor, z: &Tensor) -> Result<(Tensor, Option<Tensor>)> {
        self.pi.forward(&Tensor::cat(&[obs, z], D::Minus1)?)
    }

    /// Reparameterized actions and their log probabilities, regardless of the
    /// deterministic flag.
    pub fn rsample(&self, obs: &Tensor, z: &Tensor) -> Result<(Tensor, Tensor)> {
        self.pi.rsample(&Tensor::cat(&[obs, z], D::Minus1)?)
    }

    /// Sets whether the policy outputs `tanh(mean)`.
    pub fn set_deterministic(&mut self, v: bool) {
        self.pi.set_deterministic(v);
    }

    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Variables of the network.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }
}
