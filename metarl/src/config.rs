use anyhow::Result;
use metarl_candle_agent::{
    gru::GaussianGruConfig,
    opt::OptimizerConfig,
    pearl::{EntCoefMode, PearlSacConfig},
    Device,
};
use metarl_core::{MetaLearnerConfig, TaskSplit};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Parameters of the multi-task environment.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EnvParams {
    /// The number of tasks.
    pub n_tasks: usize,

    /// If `true`, goals of tasks are sampled at random.
    pub randomize_tasks: bool,

    /// Dimension of observations.
    pub observ_dim: usize,

    /// Dimension of actions.
    pub action_dim: usize,
}

/// Hyperparameters of the SAC agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SacParams {
    /// Discount factor.
    pub gamma: f64,

    /// Weight of the KL divergence.
    pub kl_lambda: f64,

    /// Coefficient of the soft update.
    pub tau: f64,

    /// Learning rate of the critics.
    pub qf_lr: f64,

    /// Learning rate of the encoder.
    pub encoder_lr: f64,

    /// Learning rate of the policy.
    pub policy_lr: f64,
}

impl Default for SacParams {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            kl_lambda: 0.1,
            tau: 5e-3,
            qf_lr: 3e-4,
            encoder_lr: 3e-4,
            policy_lr: 3e-4,
        }
    }
}

/// Configuration of a PEARL experiment.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PearlConfig {
    /// Name of the environment, e.g., `cheetah-dir`.
    pub env_name: String,

    /// Parameters of the environment.
    pub env_params: EnvParams,

    /// The number of training tasks, taken from the head of the task list.
    pub n_train_tasks: usize,

    /// The number of evaluation tasks, taken from the tail of the task list.
    pub n_eval_tasks: usize,

    /// Dimension of the latent task variable.
    pub latent_size: usize,

    /// Units of hidden layers.
    pub hidden_units: Vec<usize>,

    /// Parameters of the meta-training loop.
    pub pearl_params: MetaLearnerConfig,

    /// Parameters of the SAC agent.
    pub sac_params: SacParams,
}

impl PearlConfig {
    /// Running forward or backward. Both tasks are used for training and evaluation.
    pub fn cheetah_dir() -> Self {
        Self {
            env_name: "cheetah-dir".to_string(),
            env_params: EnvParams {
                n_tasks: 2,
                randomize_tasks: true,
                observ_dim: 26,
                action_dim: 6,
            },
            n_train_tasks: 2,
            n_eval_tasks: 2,
            latent_size: 5,
            hidden_units: vec![300, 300, 300],
            pearl_params: MetaLearnerConfig::default().meta_batch_size(2),
            sac_params: SacParams::default(),
        }
    }

    /// Running at a target velocity.
    pub fn cheetah_vel() -> Self {
        Self {
            env_name: "cheetah-vel".to_string(),
            env_params: EnvParams {
                n_tasks: 130,
                randomize_tasks: true,
                observ_dim: 26,
                action_dim: 6,
            },
            n_train_tasks: 100,
            n_eval_tasks: 30,
            latent_size: 5,
            hidden_units: vec![300, 300, 300],
            pearl_params: MetaLearnerConfig::default(),
            sac_params: SacParams::default(),
        }
    }

    /// Configuration of the agent on the given device.
    pub fn agent_config(&self, device: Device) -> PearlSacConfig {
        let sac = &self.sac_params;
        let mut config = PearlSacConfig::default()
            .dims(self.env_params.observ_dim, self.env_params.action_dim)
            .latent_dim(self.latent_size)
            .units(self.hidden_units.clone())
            .gamma(sac.gamma)
            .kl_lambda(sac.kl_lambda)
            .tau(sac.tau)
            .ent_coef_mode(EntCoefMode::Auto {
                target_entropy: None,
                lr: sac.policy_lr,
            })
            .seed(self.pearl_params.seed)
            .device(device);
        config.policy_opt_config = OptimizerConfig::Adam { lr: sac.policy_lr };
        config.qf_opt_config = OptimizerConfig::Adam { lr: sac.qf_lr };
        config.encoder_opt_config = OptimizerConfig::Adam { lr: sac.encoder_lr };
        config
    }

    /// Configuration of the recurrent policy of RL² on the same environment.
    pub fn gru_config(&self, hidden_dim: usize) -> GaussianGruConfig {
        let EnvParams {
            observ_dim,
            action_dim,
            ..
        } = self.env_params;
        // A transition is (obs, act, reward, done).
        let in_dim = observ_dim + action_dim + 2;
        let init_log_std = match self.env_name.as_str() {
            "cheetah-dir" => -0.5,
            _ => -1.0,
        };
        GaussianGruConfig::new(in_dim, action_dim, hidden_dim).init_log_std(init_log_std)
    }

    /// Splits task indices `0..n_tasks` into training and evaluation tasks.
    pub fn task_split(&self) -> Result<TaskSplit> {
        let tasks = (0..self.env_params.n_tasks).collect::<Vec<_>>();
        TaskSplit::new(&tasks, self.n_train_tasks, self.n_eval_tasks)
    }

    /// Constructs [`PearlConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PearlConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
