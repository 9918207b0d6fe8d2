//! Critic of PEARL.
use crate::{
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
};
use anyhow::Result;
use candle_core::{backprop::GradStore, DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};

/// Action-value function `Q(obs, act, z)`.
pub struct Critic {
    varmap: VarMap,
    q: Mlp,
    opt: Optimizer,
}

impl Critic {
    /// Constructs [`Critic`].
    ///
    /// `q_config` takes the concatenation of observations, actions and the
    /// latent task variable.
    pub fn build(q_config: MlpConfig, opt_config: &OptimizerConfig, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
            Mlp::build(vb.pp("qf"), q_config)?
        };
        let opt = opt_config.build(varmap.all_vars())?;

        Ok(Self { varmap, q, opt })
    }

    /// Outputs action values of shape `(batch, 1)`.
    pub fn forward(&self, obs: &Tensor, act: &Tensor, z: &Tensor) -> Result<Tensor> {
        self.q.forward_flat(&[obs, act, z])
    }

    /// Updates the parameters with gradients computed beforehand.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        self.opt.step(grads)
    }

    /// Variables of the network.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }
}
