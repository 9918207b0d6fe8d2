//! Policy.
use super::Transition;
use anyhow::Result;

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic.
pub trait Policy {
    /// Sample an action given an observation.
    fn sample(&mut self, obs: &[f32]) -> Result<Vec<f32>>;
}

/// A policy conditioned on a latent task variable inferred from context.
///
/// The latent variable `z` is drawn from the prior until a posterior is inferred
/// from the transitions pushed with [`ContextualPolicy::update_context`].
pub trait ContextualPolicy: Policy {
    /// Resets the posterior to the prior, samples a new `z` and drops the context.
    fn clear_z(&mut self) -> Result<()>;

    /// Appends a transition to the context.
    fn update_context(&mut self, transition: &Transition) -> Result<()>;

    /// Infers the posterior from the context collected so far and samples a new `z`.
    fn infer_posterior(&mut self) -> Result<()>;

    /// If `true`, the policy outputs the mode of the action distribution.
    fn set_deterministic(&mut self, v: bool);
}
