//! This module is used for tests.
//!
//! The objects here implement the traits of the crate with trivial behavior so
//! that rollout collection and the meta-training loop can be exercised without
//! a simulator or a deep learning backend.
use crate::{
    error::MetaRlError,
    record::{Record, RecordValue},
    ContextualPolicy, Env, MetaAgent, MultiTaskBuffer, Policy, Step, Trajectory, Transition,
};
use anyhow::Result;
use std::collections::HashMap;

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Goal positions, one per task.
    pub goals: Vec<f32>,

    /// Episodes terminate after this number of steps.
    pub episode_len: usize,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            goals: vec![-1.0, -0.5, 0.5, 1.0],
            episode_len: 5,
        }
    }
}

impl DummyEnvConfig {
    /// Sets goal positions.
    pub fn goals(mut self, v: Vec<f32>) -> Self {
        self.goals = v;
        self
    }

    /// Sets the length of episodes.
    pub fn episode_len(mut self, v: usize) -> Self {
        self.episode_len = v;
        self
    }
}

/// Dummy env.
///
/// A point on a line moves by the action. The reward is the negative distance
/// to the goal of the current task.
pub struct DummyEnv {
    config: DummyEnvConfig,
    task: usize,
    pos: f32,
    t: usize,
}

impl DummyEnv {
    /// The index of the current task.
    pub fn task(&self) -> usize {
        self.task
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            task: 0,
            pos: 0.0,
            t: 0,
        })
    }

    fn get_all_task_idx(&self) -> Vec<usize> {
        (0..self.config.goals.len()).collect()
    }

    fn reset_task(&mut self, idx: usize) -> Result<()> {
        if idx >= self.config.goals.len() {
            return Err(MetaRlError::UnknownTask(idx).into());
        }
        self.task = idx;
        Ok(())
    }

    fn reset(&mut self) -> Result<Vec<f32>> {
        self.pos = 0.0;
        self.t = 0;
        Ok(vec![self.pos])
    }

    fn step(&mut self, act: &[f32]) -> Result<(Step, Record)> {
        self.pos += act.iter().sum::<f32>();
        self.t += 1;
        let reward = -(self.pos - self.config.goals[self.task]).abs();
        let is_terminated = self.t >= self.config.episode_len;
        let step = Step::new(vec![self.pos], reward, is_terminated, false);
        Ok((step, Record::from_scalar("reward", reward)))
    }
}

/// Dummy policy, taking a constant action.
#[derive(Default)]
pub struct DummyPolicy {
    /// Transitions pushed as context.
    pub context: Vec<Transition>,

    /// The number of calls of [`ContextualPolicy::infer_posterior`].
    pub n_posterior_updates: usize,

    /// The number of calls of [`ContextualPolicy::clear_z`].
    pub n_clear_z: usize,

    /// Deterministic flag.
    pub is_deterministic: bool,

    /// The number of calls of [`MetaAgent::train_model`].
    pub n_train_model: usize,

    /// Sizes of meta batches given to [`MetaAgent::train_model`].
    pub meta_batch_sizes: Vec<usize>,

    train: bool,
}

impl Policy for DummyPolicy {
    fn sample(&mut self, _obs: &[f32]) -> Result<Vec<f32>> {
        match self.is_deterministic {
            true => Ok(vec![0.0]),
            false => Ok(vec![0.5]),
        }
    }
}

impl ContextualPolicy for DummyPolicy {
    fn clear_z(&mut self) -> Result<()> {
        self.context.clear();
        self.n_clear_z += 1;
        Ok(())
    }

    fn update_context(&mut self, transition: &Transition) -> Result<()> {
        self.context.push(transition.clone());
        Ok(())
    }

    fn infer_posterior(&mut self) -> Result<()> {
        self.n_posterior_updates += 1;
        Ok(())
    }

    fn set_deterministic(&mut self, v: bool) {
        self.is_deterministic = v;
    }
}

impl MetaAgent for DummyPolicy {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn train_model(
        &mut self,
        context_batch: &[Vec<Transition>],
        transition_batch: &[Vec<Transition>],
    ) -> Result<Record> {
        debug_assert_eq!(context_batch.len(), transition_batch.len());
        self.n_train_model += 1;
        self.meta_batch_sizes.push(context_batch.len());
        Ok(Record::from_slice(&[
            ("policy_loss", RecordValue::Scalar(1.0)),
            ("qf1_loss", RecordValue::Scalar(2.0)),
        ]))
    }
}

/// Dummy buffer, keeping all transitions and returning them in a cyclic order.
#[derive(Default)]
pub struct DummyBuffer {
    data: HashMap<usize, Vec<Transition>>,
    cursor: HashMap<usize, usize>,
}

impl MultiTaskBuffer for DummyBuffer {
    fn add_trajs(&mut self, task: usize, trajs: &[Trajectory]) -> Result<()> {
        let data = self.data.entry(task).or_insert_with(Vec::new);
        for traj in trajs.iter() {
            data.extend(traj.transitions.iter().cloned());
        }
        Ok(())
    }

    fn clear_task(&mut self, task: usize) {
        self.data.remove(&task);
        self.cursor.remove(&task);
    }

    fn sample(&mut self, task: usize, batch_size: usize) -> Result<Vec<Transition>> {
        let data = match self.data.get(&task) {
            Some(data) if !data.is_empty() => data,
            _ => return Err(MetaRlError::UnknownTask(task).into()),
        };
        let cursor = self.cursor.entry(task).or_insert(0);
        let batch = (0..batch_size)
            .map(|i| data[(*cursor + i) % data.len()].clone())
            .collect();
        *cursor = (*cursor + batch_size) % data.len();
        Ok(batch)
    }

    fn len(&self, task: usize) -> usize {
        self.data.get(&task).map_or(0, |v| v.len())
    }
}
