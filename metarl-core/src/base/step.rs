//! Environment step and transitions.

/// Represents an observation and reward `(o_t+1, r_t)` emitted by an environment
/// after an action.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Observation.
    pub obs: Vec<f32>,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if episode is terminated.
    pub is_terminated: bool,

    /// Flag denoting if episode is truncated.
    pub is_truncated: bool,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(obs: Vec<f32>, reward: f32, is_terminated: bool, is_truncated: bool) -> Self {
        Self {
            obs,
            reward,
            is_terminated,
            is_truncated,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// A transition `(o_t, a_t, r_t, o_t+1, is_done_t)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Observation `o_t`.
    pub obs: Vec<f32>,

    /// Action `a_t`.
    pub act: Vec<f32>,

    /// Reward `r_t`.
    pub reward: f32,

    /// Observation `o_t+1`.
    pub next_obs: Vec<f32>,

    /// `true` if the episode terminated at this transition.
    pub is_done: bool,
}

impl Transition {
    /// Dimension of the vector returned by [`Transition::to_context`].
    pub fn context_dim(&self) -> usize {
        self.obs.len() + self.act.len() + 1
    }

    /// Returns `(o_t, a_t, r_t)` as a flat vector, the input of context encoders.
    pub fn to_context(&self) -> Vec<f32> {
        let mut v = Vec::with_capacity(self.context_dim());
        v.extend_from_slice(&self.obs);
        v.extend_from_slice(&self.act);
        v.push(self.reward);
        v
    }
}

/// A sequence of transitions in an episode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    /// Transitions.
    pub transitions: Vec<Transition>,
}

impl Trajectory {
    /// The number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if no transition is in the trajectory.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Sum of rewards.
    pub fn total_reward(&self) -> f32 {
        self.transitions.iter().map(|t| t.reward).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_context_layout() {
        let tr = Transition {
            obs: vec![1.0, 2.0],
            act: vec![3.0],
            reward: -0.5,
            next_obs: vec![4.0, 5.0],
            is_done: false,
        };
        assert_eq!(tr.context_dim(), 4);
        assert_eq!(tr.to_context(), vec![1.0, 2.0, 3.0, -0.5]);
    }

    #[test]
    fn test_total_reward() {
        let tr = |r| Transition {
            obs: vec![],
            act: vec![],
            reward: r,
            next_obs: vec![],
            is_done: false,
        };
        let traj = Trajectory {
            transitions: vec![tr(1.0), tr(2.5), tr(-0.5)],
        };
        assert_eq!(traj.len(), 3);
        assert_eq!(traj.total_reward(), 3.0);
    }
}
