//! Environment.
use super::Step;
use crate::record::Record;
use anyhow::Result;

/// Represents a multi-task environment.
///
/// A multi-task environment holds a set of tasks, e.g., variants of a locomotion
/// task with different goal velocities or directions. The active task is selected
/// with [`Env::reset_task`] and stays active until the next call of the method.
/// Observations and actions are flat `f32` vectors.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Returns the indices of all tasks of the environment.
    fn get_all_task_idx(&self) -> Vec<usize>;

    /// Switches the environment to the task of the given index.
    ///
    /// Returns [`MetaRlError::UnknownTask`](crate::error::MetaRlError::UnknownTask)
    /// if the index is not one of [`Env::get_all_task_idx`].
    fn reset_task(&mut self, idx: usize) -> Result<()>;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Vec<f32>>;

    /// Performes an environment step.
    fn step(&mut self, act: &[f32]) -> Result<(Step, Record)>;
}
