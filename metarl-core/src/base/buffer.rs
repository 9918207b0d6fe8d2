//! Interface of buffers holding transitions per task.
use super::{Trajectory, Transition};
use anyhow::Result;

/// Interface for buffers that store transitions of each task separately.
///
/// PEARL keeps two of them: one feeding the actor and critics and one
/// feeding the context encoder. How transitions are stored and evicted is
/// up to the implementation.
pub trait MultiTaskBuffer {
    /// Pushes the transitions of trajectories collected on a task.
    fn add_trajs(&mut self, task: usize, trajs: &[Trajectory]) -> Result<()>;

    /// Removes all transitions of a task.
    fn clear_task(&mut self, task: usize);

    /// Samples `batch_size` transitions of a task.
    fn sample(&mut self, task: usize, batch_size: usize) -> Result<Vec<Transition>>;

    /// The number of transitions stored for a task.
    fn len(&self, task: usize) -> usize;
}
