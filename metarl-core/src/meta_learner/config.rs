//! Configuration of [`MetaLearner`](super::MetaLearner).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`MetaLearner`](super::MetaLearner).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MetaLearnerConfig {
    /// The number of meta-training iterations.
    pub num_iterations: usize,

    /// The number of training tasks on which data is collected in each iteration.
    pub num_sample_tasks: usize,

    /// The number of transitions collected on every training task before training.
    pub num_init_samples: usize,

    /// The number of transitions collected with `z` drawn from the prior.
    pub num_prior_samples: usize,

    /// The number of transitions collected with `z` drawn from the posterior.
    pub num_posterior_samples: usize,

    /// The number of gradient steps in each iteration.
    pub num_meta_grads: usize,

    /// The number of tasks in a meta batch.
    pub meta_batch_size: usize,

    /// The number of transitions per task in a batch.
    pub batch_size: usize,

    /// The maximum number of steps in an episode.
    pub max_step: usize,

    /// The number of adaptation rollouts on each task in meta-testing.
    pub num_adapt_rollouts: usize,

    /// Interval of meta-testing in iterations.
    pub eval_interval: usize,

    /// Random seed for sampling tasks.
    pub seed: u64,
}

impl Default for MetaLearnerConfig {
    fn default() -> Self {
        Self {
            num_iterations: 1000,
            num_sample_tasks: 5,
            num_init_samples: 2000,
            num_prior_samples: 1000,
            num_posterior_samples: 1000,
            num_meta_grads: 1500,
            meta_batch_size: 4,
            batch_size: 256,
            max_step: 200,
            num_adapt_rollouts: 3,
            eval_interval: 1,
            seed: 42,
        }
    }
}

impl MetaLearnerConfig {
    /// Sets the number of meta-training iterations.
    pub fn num_iterations(mut self, v: usize) -> Self {
        self.num_iterations = v;
        self
    }

    /// Sets the number of tasks sampled for data collection in each iteration.
    pub fn num_sample_tasks(mut self, v: usize) -> Self {
        self.num_sample_tasks = v;
        self
    }

    /// Sets the numbers of transitions collected before training, with the prior
    /// and with the posterior.
    pub fn num_samples(mut self, init: usize, prior: usize, posterior: usize) -> Self {
        self.num_init_samples = init;
        self.num_prior_samples = prior;
        self.num_posterior_samples = posterior;
        self
    }

    /// Sets the number of gradient steps in each iteration.
    pub fn num_meta_grads(mut self, v: usize) -> Self {
        self.num_meta_grads = v;
        self
    }

    /// Sets the number of tasks in a meta batch.
    pub fn meta_batch_size(mut self, v: usize) -> Self {
        self.meta_batch_size = v;
        self
    }

    /// Sets the number of transitions per task in a batch.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the maximum number of steps in an episode.
    pub fn max_step(mut self, v: usize) -> Self {
        self.max_step = v;
        self
    }

    /// Sets the number of adaptation rollouts in meta-testing.
    pub fn num_adapt_rollouts(mut self, v: usize) -> Self {
        self.num_adapt_rollouts = v;
        self
    }

    /// Sets the interval of meta-testing in iterations.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`MetaLearnerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MetaLearnerConfig`].
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
    fn test_serde_meta_learner_config() -> Result<()> {
        let config = MetaLearnerConfig::default()
            .num_iterations(10)
            .num_samples(100, 50, 50)
            .meta_batch_size(2)
            .seed(7);

        let dir = TempDir::new("meta_learner_config")?;
        let path = dir.path().join("meta_learner_config.yaml");
        config.save(&path)?;
        let config_ = MetaLearnerConfig::load(&path)?;
        assert_eq!(config, config_);

        Ok(())
    }
}
