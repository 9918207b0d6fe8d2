//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum MetaRlError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The task index is not known to the environment or the buffer.
    #[error("Unknown task index: {0}")]
    UnknownTask(usize),

    /// More tasks were requested than available.
    #[error("Requested {requested} tasks, but only {available} are available")]
    InsufficientTasks {
        /// The number of requested tasks.
        requested: usize,
        /// The number of available tasks.
        available: usize,
    },

    /// No transitions have been collected for inferring the posterior.
    #[error("Context is empty")]
    EmptyContext,

    /// A rollout ended without any transition.
    #[error("Rollout produced no transitions")]
    EmptyTrajectory,
}
