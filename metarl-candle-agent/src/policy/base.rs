use super::TanhGaussianPolicyConfig;
use crate::{
    mlp::Mlp,
    model::SubModel1,
    util::{log_tanh_jacobian, normal_log_prob, uniform_linear},
};
use anyhow::{Context, Result};
use candle_core::{Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};

/// Lower bound of the log standard deviation.
pub const LOG_STD_MIN: f64 = -20.0;

/// Upper bound of the log standard deviation.
pub const LOG_STD_MAX: f64 = 2.0;

/// Gaussian policy whose samples are squashed by tanh.
///
/// A MLP trunk is followed by a mean head and a log standard deviation head.
/// The log standard deviation is clamped to `[LOG_STD_MIN, LOG_STD_MAX]`.
pub struct TanhGaussianPolicy {
    config: TanhGaussianPolicyConfig,
    net: Mlp,
    log_std_head: Linear,
    is_deterministic: bool,
}

impl TanhGaussianPolicy {
    /// Sets whether the policy outputs `tanh(mean)`.
    pub fn set_deterministic(&mut self, v: bool) {
        self.is_deterministic = v;
    }

    /// Returns `true` if the policy is deterministic.
    pub fn is_deterministic(&self) -> bool {
        self.is_deterministic
    }

    /// Mean and clamped log standard deviation before squashing.
    pub fn dist_params(&self, xs: &Tensor) -> Result<(Tensor, Tensor)> {
        let (hidden, mean) = self.net.forward_with_hidden(xs)?;
        let log_std = self
            .log_std_head
            .forward(&hidden)?
            .clamp(LOG_STD_MIN, LOG_STD_MAX)?;
        Ok((mean, log_std))
    }

    /// Samples squashed actions with the reparameterization trick and returns
    /// them with their log probabilities of shape `(batch, 1)`.
    ///
    /// With `u = mean + std * eps`, the log probability of `tanh(u)` is
    /// `Σ log N(u; mean, std) - log(1 - tanh(u)^2)`.
    pub fn rsample(&self, xs: &Tensor) -> Result<(Tensor, Tensor)> {
        let (mean, log_std) = self.dist_params(xs)?;
        let eps = mean.randn_like(0.0, 1.0)?;
        let u = (&mean + (log_std.exp()? * eps)?)?;
        let log_prob = (normal_log_prob(&u, &mean, &log_std)? - log_tanh_jacobian(&u)?)?
            .sum_keepdim(D::Minus1)?;
        Ok((u.tanh()?, log_prob))
    }

    /// Configuration of the policy.
    pub fn config(&self) -> &TanhGaussianPolicyConfig {
        &self.config
    }
}

impl SubModel1 for TanhGaussianPolicy {
    type Config = TanhGaussianPolicyConfig;
    type Input = Tensor;
    type Output = (Tensor, Option<Tensor>);

    /// Returns `tanh(mean)` for deterministic policies, otherwise the output
    /// of [`TanhGaussianPolicy::rsample`].
    fn forward(&self, xs: &Self::Input) -> Result<Self::Output> {
        if self.is_deterministic {
            let (mean, _) = self.dist_params(xs)?;
            return Ok((mean.tanh()?, None));
        }

        let (act, log_prob) = self.rsample(xs)?;
        Ok((act, Some(log_prob)))
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let last_unit = *config.units.last().context("units of policy are empty")?;
        let net = Mlp::build(vb.clone(), config.mlp_config())?;
        let log_std_head = uniform_linear(last_unit, config.out_dim, config.init_w, vb.pp("log_std"))?;

        Ok(Self {
            config,
            net,
            log_std_head,
            is_deterministic: false,
        })
    }
}
