//! Tanh-Gaussian policy.
mod base;
mod config;
pub use base::{TanhGaussianPolicy, LOG_STD_MAX, LOG_STD_MIN};
pub use config::TanhGaussianPolicyConfig;
