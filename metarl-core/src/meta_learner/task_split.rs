use crate::error::MetaRlError;
use anyhow::Result;

/// Training and evaluation tasks.
///
/// Training tasks are taken from the head of the task list and evaluation
/// tasks from its tail. The two sets overlap when the environment has fewer
/// tasks than `n_train + n_eval`, e.g., a direction task with two tasks used
/// for both training and evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskSplit {
    train: Vec<usize>,
    eval: Vec<usize>,
}

impl TaskSplit {
    /// Splits the given tasks.
    pub fn new(tasks: &[usize], n_train: usize, n_eval: usize) -> Result<Self> {
        let n = tasks.len();
        for &requested in [n_train, n_eval].iter() {
            if requested > n {
                return Err(MetaRlError::InsufficientTasks {
                    requested,
                    available: n,
                }
                .into());
            }
        }

        Ok(Self {
            train: tasks[..n_train].to_vec(),
            eval: tasks[n - n_eval..].to_vec(),
        })
    }

    /// Training tasks.
    pub fn train(&self) -> &[usize] {
        &self.train
    }

    /// Evaluation tasks.
    pub fn eval(&self) -> &[usize] {
        &self.eval
    }
}
