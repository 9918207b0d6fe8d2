//! Configuration of [`PearlSac`](super::PearlSac).
use super::EntCoefMode;
use crate::{
    encoder::MlpEncoderConfig, mlp::MlpConfig, opt::OptimizerConfig,
    policy::TanhGaussianPolicyConfig, Device,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`PearlSac`](super::PearlSac).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PearlSacConfig {
    /// Dimension of observations.
    pub observ_dim: usize,

    /// Dimension of actions.
    pub action_dim: usize,

    /// Dimension of the latent task variable.
    pub latent_dim: usize,

    /// Units of hidden layers, shared by all networks.
    pub units: Vec<usize>,

    /// Discount factor.
    pub gamma: f64,

    /// Weight of the KL divergence in the encoder loss.
    pub kl_lambda: f64,

    /// Coefficient of the soft update of target critics.
    pub tau: f64,

    /// Scale applied to rewards in the critic target.
    pub reward_scale: f64,

    /// Optimizer of the policy.
    pub policy_opt_config: OptimizerConfig,

    /// Optimizer of the critics.
    pub qf_opt_config: OptimizerConfig,

    /// Optimizer of the encoder.
    pub encoder_opt_config: OptimizerConfig,

    /// Entropy coefficient.
    pub ent_coef_mode: EntCoefMode,

    /// Seed of the random number generator of the device.
    pub seed: Option<u64>,

    /// Device on which networks are placed.
    pub device: Device,
}

impl Default for PearlSacConfig {
    fn default() -> Self {
        Self {
            observ_dim: 0,
            action_dim: 0,
            latent_dim: 5,
            units: vec![300, 300, 300],
            gamma: 0.99,
            kl_lambda: 0.1,
            tau: 5e-3,
            reward_scale: 1.0,
            policy_opt_config: OptimizerConfig::default(),
            qf_opt_config: OptimizerConfig::default(),
            encoder_opt_config: OptimizerConfig::default(),
            ent_coef_mode: EntCoefMode::default(),
            seed: None,
            device: Device::Cpu,
        }
    }
}

impl PearlSacConfig {
    /// Sets dimensions of observations and actions.
    pub fn dims(mut self, observ_dim: usize, action_dim: usize) -> Self {
        self.observ_dim = observ_dim;
        self.action_dim = action_dim;
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

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the weight of the KL divergence.
    pub fn kl_lambda(mut self, v: f64) -> Self {
        self.kl_lambda = v;
        self
    }

    /// Sets the coefficient of the soft update.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the reward scale.
    pub fn reward_scale(mut self, v: f64) -> Self {
        self.reward_scale = v;
        self
    }

    /// Sets the same learning rate on the policy, critic and encoder optimizers.
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.policy_opt_config = self.policy_opt_config.learning_rate(lr);
        self.qf_opt_config = self.qf_opt_config.learning_rate(lr);
        self.encoder_opt_config = self.encoder_opt_config.learning_rate(lr);
        self
    }

    /// Sets the entropy coefficient mode.
    pub fn ent_coef_mode(mut self, v: EntCoefMode) -> Self {
        self.ent_coef_mode = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Configuration of the encoder, taking `(obs, act, reward)`.
    pub fn encoder_config(&self) -> MlpEncoderConfig {
        MlpEncoderConfig::default()
            .in_dim(self.observ_dim, self.action_dim)
            .latent_dim(self.latent_dim)
            .units(self.units.clone())
            .opt_config(self.encoder_opt_config.clone())
    }

    /// Configuration of the policy, taking `(obs, z)`.
    pub fn policy_config(&self) -> TanhGaussianPolicyConfig {
        let in_dim = self.observ_dim + self.latent_dim;
        TanhGaussianPolicyConfig::new(in_dim, self.action_dim, self.units.clone())
    }

    /// Configuration of a critic, taking `(obs, act, z)`.
    pub fn qf_config(&self) -> MlpConfig {
        let in_dim = self.observ_dim + self.action_dim + self.latent_dim;
        MlpConfig::new(in_dim, self.units.clone(), 1).init_w(3e-3)
    }

    /// Constructs [`PearlSacConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PearlSacConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_network_configs() {
        let config = PearlSacConfig::default()
            .dims(26, 6)
            .latent_dim(5)
            .units(vec![64, 64, 64]);

        let encoder_config = config.encoder_config();
        assert_eq!(encoder_config.in_dim, 33);
        assert_eq!(encoder_config.out_dim(), 10);
        assert_eq!(config.policy_config().in_dim, 31);
        assert_eq!(config.policy_config().init_w, 1e-3);
        assert_eq!(config.qf_config().in_dim(), 37);
        assert_eq!(config.qf_config().out_dim(), 1);
    }

    #[test]
    fn test_serde_pearl_sac_config() -> Result<()> {
        let config = PearlSacConfig::default()
            .dims(26, 6)
            .kl_lambda(0.5)
            .learning_rate(1e-3)
            .ent_coef_mode(EntCoefMode::Fix(0.2))
            .seed(3);

        let dir = TempDir::new("pearl_sac_config")?;
        let path = dir.path().join("pearl_sac_config.yaml");
        config.save(&path)?;
        let config_ = PearlSacConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
