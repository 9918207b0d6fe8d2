//! Meta-training loop of PEARL.
mod base;
mod config;
mod task_split;
pub use base::{MetaLearner, MetaTestResult};
pub use config::MetaLearnerConfig;
pub use task_split::TaskSplit;
