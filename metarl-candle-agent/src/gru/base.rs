use super::GaussianGruConfig;
use crate::{
    model::SubModel2,
    util::{normal_log_prob, uniform_linear},
};
use anyhow::Result;
use candle_core::{Tensor, D};
use candle_nn::{
    rnn::{gru, GRUConfig, GRUState, GRU, RNN},
    Init, Linear, Module, VarBuilder,
};

/// Gaussian policy on top of a single-layer GRU.
///
/// Each call of [`SubModel2::forward`] advances the GRU by one step. The
/// standard deviation is a learned parameter shared by all states.
pub struct GaussianGru {
    config: GaussianGruConfig,
    gru: GRU,
    mean_head: Linear,
    log_std: Tensor,
    is_deterministic: bool,
}

impl GaussianGru {
    /// Hidden state of zeros of shape `(batch, hidden_dim)`.
    pub fn zero_hidden(&self, batch: usize) -> Result<Tensor> {
        Ok(self.gru.zero_state(batch)?.h().clone())
    }

    /// Sets whether the policy outputs the mean.
    pub fn set_deterministic(&mut self, v: bool) {
        self.is_deterministic = v;
    }

    /// Mean of the action distribution and the next hidden state.
    fn mean_hidden(&self, xs: &Tensor, h: &Tensor) -> Result<(Tensor, Tensor)> {
        let state = self.gru.step(xs, &GRUState { h: h.clone() })?;
        let h = state.h().clone();
        let mean = self.mean_head.forward(&h.relu()?)?;
        Ok((mean, h))
    }

    /// Log probability of given actions, summed over action dimensions.
    pub fn get_log_prob(&self, xs: &Tensor, h: &Tensor, act: &Tensor) -> Result<Tensor> {
        let (mean, _) = self.mean_hidden(xs, h)?;
        let log_prob = normal_log_prob(act, &mean, &self.log_std)?;
        Ok(log_prob.sum(D::Minus1)?)
    }

    /// Log standard deviation.
    pub fn log_std(&self) -> &Tensor {
        &self.log_std
    }

    /// Configuration of the network.
    pub fn config(&self) -> &GaussianGruConfig {
        &self.config
    }
}

impl SubModel2 for GaussianGru {
    type Config = GaussianGruConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = (Tensor, Option<Tensor>, Tensor);

    /// Returns actions, their log probabilities for stochastic policies and the
    /// next hidden state.
    ///
    /// Stochastic actions are sampled without the reparameterization trick.
    fn forward(&self, xs: &Tensor, h: &Tensor) -> Result<Self::Output> {
        let (mean, h) = self.mean_hidden(xs, h)?;

        if self.is_deterministic {
            return Ok((mean, None, h));
        }

        let eps = mean.randn_like(0.0, 1.0)?;
        let act = mean
            .broadcast_add(&self.log_std.exp()?.broadcast_mul(&eps)?)?
            .detach();
        let log_prob = normal_log_prob(&act, &mean, &self.log_std)?.sum(D::Minus1)?;

        Ok((act, Some(log_prob), h))
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let gru = gru(
            config.in_dim,
            config.hidden_dim,
            GRUConfig::default(),
            vb.pp("gru"),
        )?;
        let mean_head = uniform_linear(config.hidden_dim, config.out_dim, config.init_w, vb.pp("mean"))?;
        let init = Init::Const(config.init_log_std);
        let log_std = vb.get_with_hints(config.out_dim, "log_std", init)?;

        Ok(Self {
            config,
            gru,
            mean_head,
            log_std,
            is_deterministic: false,
        })
    }
}
