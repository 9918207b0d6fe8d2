//! Recurrent Gaussian policy of RL².
//!
//! The hidden state of the GRU carries information about the current task
//! across episodes, so the policy adapts without an explicit latent variable.
mod base;
mod config;
pub use base::GaussianGru;
pub use config::GaussianGruConfig;
