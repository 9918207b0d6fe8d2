//! Rollout collection.
//!
//! The sampler runs episodes of a [`ContextualPolicy`] on the current task of an
//! [`Env`]. Transitions can be fed back into the context of the policy while an
//! episode runs, and the posterior over the latent task variable can be updated
//! after each episode.
use crate::{error::MetaRlError, ContextualPolicy, Env, Trajectory, Transition};
use anyhow::Result;
use log::trace;

/// Collects trajectories on the current task of an environment.
pub struct Sampler {
    /// The maximum number of steps in an episode.
    max_step: usize,
}

impl Sampler {
    /// Creates a sampler truncating episodes at `max_step` steps.
    pub fn new(max_step: usize) -> Self {
        Self { max_step }
    }

    /// The maximum number of steps in an episode.
    pub fn max_step(&self) -> usize {
        self.max_step
    }

    /// Runs an episode.
    ///
    /// The episode ends when the environment is done or after `max_step` steps.
    /// If `accum_context` is `true`, each transition is pushed into the context
    /// of the policy right after the environment step.
    pub fn rollout<E, P>(&self, env: &mut E, policy: &mut P, accum_context: bool) -> Result<Trajectory>
    where
        E: Env,
        P: ContextualPolicy + ?Sized,
    {
        let mut traj = Trajectory::default();
        let mut obs = env.reset()?;

        for _ in 0..self.max_step {
            let act = policy.sample(&obs)?;
            let (step, _record) = env.step(&act)?;
            let is_done = step.is_done();
            let transition = Transition {
                obs,
                act,
                reward: step.reward,
                next_obs: step.obs,
                is_done: step.is_terminated,
            };

            if accum_context {
                policy.update_context(&transition)?;
            }

            obs = transition.next_obs.clone();
            traj.transitions.push(transition);

            if is_done {
                break;
            }
        }

        trace!("Rollout finished with {} steps", traj.len());
        Ok(traj)
    }

    /// Collects trajectories until at least `max_samples` transitions are obtained.
    ///
    /// If `update_posterior` is `true`, the posterior is inferred from the context
    /// of the policy after each trajectory. Returns the trajectories and the number
    /// of collected transitions. Fails with [`MetaRlError::EmptyTrajectory`] if a
    /// rollout yields no transition.
    pub fn obtain_samples<E, P>(
        &self,
        env: &mut E,
        policy: &mut P,
        max_samples: usize,
        update_posterior: bool,
        accum_context: bool,
    ) -> Result<(Vec<Trajectory>, usize)>
    where
        E: Env,
        P: ContextualPolicy + ?Sized,
    {
        let mut trajs = vec![];
        let mut n_samples = 0;

        while n_samples < max_samples {
            let traj = self.rollout(env, policy, accum_context)?;
            if traj.is_empty() {
                return Err(MetaRlError::EmptyTrajectory.into());
            }
            n_samples += traj.len();
            trajs.push(traj);

            if update_posterior {
                policy.infer_posterior()?;
            }
        }

        Ok((trajs, n_samples))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dummy::{DummyEnv, DummyEnvConfig, DummyPolicy};

    #[test]
    fn test_rollout_truncated_at_max_step() -> Result<()> {
        let config = DummyEnvConfig::default().episode_len(100);
        let mut env = DummyEnv::build(&config, 0)?;
        let mut policy = DummyPolicy::default();
        let traj = Sampler::new(7).rollout(&mut env, &mut policy, true)?;

        assert_eq!(traj.len(), 7);
        assert_eq!(policy.context.len(), 7);
        assert!(traj.transitions.iter().all(|t| !t.is_done));
        Ok(())
    }

    #[test]
    fn test_rollout_stops_when_done() -> Result<()> {
        let config = DummyEnvConfig::default().episode_len(3);
        let mut env = DummyEnv::build(&config, 0)?;
        let mut policy = DummyPolicy::default();
        let traj = Sampler::new(10).rollout(&mut env, &mut policy, false)?;

        assert_eq!(traj.len(), 3);
        assert!(traj.transitions[2].is_done);
        assert!(policy.context.is_empty());
        Ok(())
    }

    #[test]
    fn test_obtain_samples() -> Result<()> {
        let config = DummyEnvConfig::default().episode_len(4);
        let mut env = DummyEnv::build(&config, 0)?;
        let mut policy = DummyPolicy::default();
        let sampler = Sampler::new(10);

        let (trajs, n) = sampler.obtain_samples(&mut env, &mut policy, 10, true, true)?;
        assert_eq!(trajs.len(), 3);
        assert_eq!(n, 12);
        assert_eq!(policy.n_posterior_updates, 3);

        let (trajs, n) = sampler.obtain_samples(&mut env, &mut policy, 0, true, true)?;
        assert!(trajs.is_empty());
        assert_eq!(n, 0);
        Ok(())
    }

    #[test]
    fn test_obtain_samples_without_steps() -> Result<()> {
        let mut env = DummyEnv::build(&DummyEnvConfig::default(), 0)?;
        let mut policy = DummyPolicy::default();
        let err = Sampler::new(0)
            .obtain_samples(&mut env, &mut policy, 5, false, false)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MetaRlError>(),
            Some(MetaRlError::EmptyTrajectory)
        ));
        Ok(())
    }
}
