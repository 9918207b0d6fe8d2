//! Configuration of PEARL experiments on task families of HalfCheetah.
//!
//! The `pearl` binary builds the agent and the meta-learner from a
//! [`PearlConfig`]. Simulating the environments is outside this workspace;
//! any [`metarl_core::Env`] implementation can be trained with
//! [`metarl_core::MetaLearner`].
mod config;
pub use config::{EnvParams, PearlConfig, SacParams};
