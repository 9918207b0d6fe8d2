use super::{MetaLearnerConfig, TaskSplit};
use crate::{
    error::MetaRlError,
    record::{Record, RecordValue, Recorder},
    Env, MetaAgent, MultiTaskBuffer, Sampler,
};
use anyhow::{ensure, Result};
use chrono::Local;
use log::{info, trace};

/// Result of meta-testing.
#[derive(Clone, Debug, PartialEq)]
pub struct MetaTestResult {
    /// Return of the last adaptation rollout on each evaluation task.
    pub returns: Vec<f32>,

    /// Mean return over evaluation tasks of each adaptation rollout.
    pub curve: Vec<f32>,
}

impl MetaTestResult {
    /// Mean of [`MetaTestResult::returns`].
    pub fn mean_return(&self) -> f32 {
        match self.returns.len() {
            0 => 0.0,
            n => self.returns.iter().sum::<f32>() / n as f32,
        }
    }

    /// Converts the result into a record.
    pub fn to_record(&self) -> Record {
        Record::from_slice(&[
            ("return_eval", RecordValue::Array1(self.returns.clone())),
            ("return_eval_mean", RecordValue::Scalar(self.mean_return())),
            ("return_curve", RecordValue::Array1(self.curve.clone())),
        ])
    }
}

/// Manages the meta-training loop.
///
/// Each iteration of meta-training consists of
///
/// 1. Data collection. On `num_sample_tasks` training tasks sampled at random,
///    transitions are collected with the latent task variable drawn from the prior
///    (stored in both the RL buffer and the encoder buffer) and from the posterior
///    (stored in the RL buffer only). In the first iteration, `num_init_samples`
///    transitions are collected on every training task beforehand.
/// 2. Optimization. In each of `num_meta_grads` steps, a meta batch of distinct
///    training tasks is sampled. For each task, context transitions are taken from
///    the encoder buffer and RL transitions from the RL buffer, then given to
///    [`MetaAgent::train_model`].
/// 3. Meta-testing on the evaluation tasks, every `eval_interval` iterations.
pub struct MetaLearner {
    config: MetaLearnerConfig,
    tasks: TaskSplit,
    sampler: Sampler,
    rng: fastrand::Rng,
    n_iters: usize,
    n_train_steps: usize,
}

impl MetaLearner {
    /// Constructs [`MetaLearner`].
    pub fn new(config: MetaLearnerConfig, tasks: TaskSplit) -> Result<Self> {
        let available = tasks.train().len();
        if available == 0 || config.meta_batch_size > available {
            return Err(MetaRlError::InsufficientTasks {
                requested: config.meta_batch_size.max(1),
                available,
            }
            .into());
        }
        ensure!(config.meta_batch_size > 0, "meta_batch_size must be positive");
        ensure!(config.max_step > 0, "max_step must be positive");
        let sampler = Sampler::new(config.max_step);
        let rng = fastrand::Rng::with_seed(config.seed);

        Ok(Self {
            config,
            tasks,
            sampler,
            rng,
            n_iters: 0,
            n_train_steps: 0,
        })
    }

    /// The number of finished iterations.
    pub fn n_iters(&self) -> usize {
        self.n_iters
    }

    /// The number of calls of [`MetaAgent::train_model`].
    pub fn n_train_steps(&self) -> usize {
        self.n_train_steps
    }

    /// Collects transitions on a task and pushes them into buffers.
    ///
    /// The latent task variable is reset to the prior beforehand. If
    /// `update_posterior` is `true`, transitions are accumulated as context and
    /// the posterior is inferred from them after each trajectory, so that later
    /// trajectories are collected with `z` drawn from the posterior.
    #[allow(clippy::too_many_arguments)]
    pub fn collect_data<E, A, B>(
        &self,
        env: &mut E,
        agent: &mut A,
        task: usize,
        num_samples: usize,
        update_posterior: bool,
        rl_buffer: &mut B,
        enc_buffer: Option<&mut B>,
    ) -> Result<usize>
    where
        E: Env,
        A: MetaAgent + ?Sized,
        B: MultiTaskBuffer,
    {
        env.reset_task(task)?;
        agent.clear_z()?;
        agent.set_deterministic(false);

        let (trajs, n_samples) = self.sampler.obtain_samples(
            env,
            agent,
            num_samples,
            update_posterior,
            update_posterior,
        )?;
        rl_buffer.add_trajs(task, &trajs)?;
        if let Some(enc_buffer) = enc_buffer {
            enc_buffer.add_trajs(task, &trajs)?;
        }
        trace!("Collected {} transitions on task {}", n_samples, task);

        Ok(n_samples)
    }

    /// Samples distinct training tasks for a meta batch.
    pub fn sample_meta_batch(&mut self) -> Vec<usize> {
        let mut tasks = self.tasks.train().to_vec();
        self.rng.shuffle(&mut tasks);
        tasks.truncate(self.config.meta_batch_size);
        tasks
    }

    /// Runs the meta-training loop.
    pub fn meta_train<E, A, B, R>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        rl_buffer: &mut B,
        enc_buffer: &mut B,
        recorder: &mut R,
    ) -> Result<()>
    where
        E: Env,
        A: MetaAgent + ?Sized,
        B: MultiTaskBuffer,
        R: Recorder + ?Sized,
    {
        let train_tasks = self.tasks.train().to_vec();

        for _ in 0..self.config.num_iterations {
            agent.train();

            if self.n_iters == 0 {
                info!("Collecting initial samples on {} tasks", train_tasks.len());
                for &task in train_tasks.iter() {
                    let n = self.config.num_init_samples;
                    let enc = Some(&mut *enc_buffer);
                    self.collect_data(env, agent, task, n, false, rl_buffer, enc)?;
                }
            }

            for _ in 0..self.config.num_sample_tasks {
                let task = train_tasks[self.rng.usize(..train_tasks.len())];
                enc_buffer.clear_task(task);

                if self.config.num_prior_samples > 0 {
                    let n = self.config.num_prior_samples;
                    let enc = Some(&mut *enc_buffer);
                    self.collect_data(env, agent, task, n, false, rl_buffer, enc)?;
                }
                if self.config.num_posterior_samples > 0 {
                    let n = self.config.num_posterior_samples;
                    self.collect_data(env, agent, task, n, true, rl_buffer, None)?;
                }
            }

            for _ in 0..self.config.num_meta_grads {
                let tasks = self.sample_meta_batch();
                let mut context_batch = Vec::with_capacity(tasks.len());
                let mut transition_batch = Vec::with_capacity(tasks.len());
                for &task in tasks.iter() {
                    context_batch.push(enc_buffer.sample(task, self.config.batch_size)?);
                    transition_batch.push(rl_buffer.sample(task, self.config.batch_size)?);
                }

                let record = agent.train_model(&context_batch, &transition_batch)?;
                recorder.store(record);
                self.n_train_steps += 1;
            }

            self.n_iters += 1;
            recorder.flush(self.n_iters as _);

            if self.config.eval_interval > 0 && self.n_iters % self.config.eval_interval == 0 {
                let result = self.meta_test(env, agent)?;
                info!(
                    "Iteration {}: mean return on evaluation tasks {:.3}",
                    self.n_iters,
                    result.mean_return()
                );
                let mut record = result.to_record();
                record.insert("iteration", RecordValue::Scalar(self.n_iters as f32));
                record.insert("datetime", RecordValue::DateTime(Local::now()));
                recorder.write(record);
            }
        }

        Ok(())
    }

    /// Evaluates the agent on the evaluation tasks.
    ///
    /// On each task, the latent task variable starts from the prior. After each of
    /// `num_adapt_rollouts` rollouts, whose transitions are accumulated as context,
    /// the posterior is updated. The policy acts deterministically.
    pub fn meta_test<E, A>(&self, env: &mut E, agent: &mut A) -> Result<MetaTestResult>
    where
        E: Env,
        A: MetaAgent + ?Sized,
    {
        let n_rollouts = self.config.num_adapt_rollouts;
        let eval_tasks = self.tasks.eval();
        let mut curve = vec![0f32; n_rollouts];
        let mut returns = Vec::with_capacity(eval_tasks.len());

        agent.eval();
        agent.set_deterministic(true);

        for &task in eval_tasks.iter() {
            env.reset_task(task)?;
            agent.clear_z()?;

            let mut last_return = 0.0;
            for r in curve.iter_mut() {
                let traj = self.sampler.rollout(env, agent, true)?;
                agent.infer_posterior()?;
                last_return = traj.total_reward();
                *r += last_return / eval_tasks.len() as f32;
            }
            returns.push(last_return);
        }

        agent.set_deterministic(false);
        agent.train();

        Ok(MetaTestResult { returns, curve })
    }
}
