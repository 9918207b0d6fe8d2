//! Soft actor-critic agent of PEARL.
//!
//! The policy and the critics take the latent task variable `z` as an
//! additional input. The encoder is trained through the critic loss and the KL
//! divergence of the posterior from the prior; the policy loss does not
//! propagate into the encoder.
mod actor;
mod base;
mod config;
mod critic;
mod ent_coef;
pub use actor::Actor;
pub use base::PearlSac;
pub use config::PearlSacConfig;
pub use critic::Critic;
pub use ent_coef::{EntCoef, EntCoefMode};
