//! Context encoder of PEARL.
//!
//! The encoder maps each context transition `(obs, act, reward)` to a Gaussian
//! factor over the latent task variable `z`. Factors of a task are fused into
//! the posterior `q(z | c)` by the product of Gaussians.
mod base;
mod config;
pub use base::MlpEncoder;
pub use config::MlpEncoderConfig;
