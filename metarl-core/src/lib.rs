#![warn(missing_docs)]
//! Core of a library for meta reinforcement learning.
//!
//! This crate is independent of any deep learning backend. It defines
//! multi-task environments, policies conditioned on a latent task variable,
//! rollout collection and the meta-training loop of PEARL.
pub mod dummy;
pub mod error;
pub mod record;

mod base;
pub use base::{
    ContextualPolicy, Env, MetaAgent, MultiTaskBuffer, Policy, Step, Trajectory, Transition,
};

mod sampler;
pub use sampler::Sampler;

mod meta_learner;
pub use meta_learner::{MetaLearner, MetaLearnerConfig, MetaTestResult, TaskSplit};
