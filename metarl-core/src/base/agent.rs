//! Agent.
use super::{ContextualPolicy, Transition};
use crate::record::Record;
use anyhow::Result;

/// Represents a trainable policy conditioned on the latent task variable.
pub trait MetaAgent: ContextualPolicy {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step and returns some information.
    ///
    /// Both arguments contain one set of transitions per task in the meta batch,
    /// in the same task order. `context_batch` is used to infer the posterior over
    /// the latent task variable, while `transition_batch` is used for computing the
    /// losses of the actor and critics.
    fn train_model(
        &mut self,
        context_batch: &[Vec<Transition>],
        transition_batch: &[Vec<Transition>],
    ) -> Result<Record>;
}
