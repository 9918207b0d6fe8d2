//! Utilities.
use anyhow::{ensure, Context, Result};
use candle_core::{Device, Tensor, D};
use candle_nn::{Init, Linear, VarBuilder, VarMap};
use log::trace;
use metarl_core::{error::MetaRlError, Transition};

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("track(tau = {})", tau);
    let dest = dest.data().lock().unwrap();
    let src = src.data().lock().unwrap();

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .with_context(|| format!("{} is not in the source", k_dest))?;
        let t_src = v_src.as_tensor();
        let t_dest = v_dest.as_tensor();
        let t_dest = ((tau * t_src)? + ((1.0 - tau) * t_dest)?)?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Linear layer with weights and biases drawn uniformly from `[-init_w, init_w]`.
pub fn uniform_linear(in_dim: usize, out_dim: usize, init_w: f64, vb: VarBuilder) -> Result<Linear> {
    let init = Init::Uniform {
        lo: -init_w,
        up: init_w,
    };
    let ws = vb.get_with_hints((out_dim, in_dim), "weight", init)?;
    let bs = vb.get_with_hints(out_dim, "bias", init)?;
    Ok(Linear::new(ws, Some(bs)))
}

/// Softplus, `ln(1 + exp(x))`, computed as `max(x, 0) + ln(1 + exp(-|x|))`.
pub fn softplus(x: &Tensor) -> Result<Tensor> {
    let tail = (x.abs()?.neg()?.exp()? + 1.0)?.log()?;
    Ok((x.relu()? + tail)?)
}

/// Elementwise log density of the normal distribution.
pub fn normal_log_prob(x: &Tensor, mean: &Tensor, log_std: &Tensor) -> Result<Tensor> {
    let log_sqrt_2pi = 0.5 * (2.0 * std::f64::consts::PI).ln();
    let std = log_std.exp()?;
    let z = x.broadcast_sub(mean)?.broadcast_div(&std)?;
    let tmp = ((-0.5 * z.sqr()?)? - log_sqrt_2pi)?;
    Ok(tmp.broadcast_sub(log_std)?)
}

/// `ln(1 - tanh(u)^2)` computed as `2 (ln 2 - u - softplus(-2u))`.
pub fn log_tanh_jacobian(u: &Tensor) -> Result<Tensor> {
    let sp = softplus(&(u * -2.0)?)?;
    let tmp = ((u.neg()? - sp)? + 2f64.ln())?;
    Ok((tmp * 2.0)?)
}

/// Elementwise KL divergence from `N(mean, var)` to `N(0, 1)`.
pub fn kl_std_normal(mean: &Tensor, var: &Tensor) -> Result<Tensor> {
    let tmp = ((var + mean.sqr()?)? - var.log()?)?;
    Ok(((tmp - 1.0)? * 0.5)?)
}

/// Stacks context transitions into a tensor of shape `(tasks, n, obs + act + 1)`.
///
/// All tasks must have the same number of transitions.
pub fn context_tensor(batch: &[Vec<Transition>], device: &Device) -> Result<Tensor> {
    let n_tasks = batch.len();
    let first = batch
        .first()
        .and_then(|ts| ts.first())
        .ok_or(MetaRlError::EmptyContext)?;
    let n = batch[0].len();
    let dim = first.context_dim();
    ensure!(
        batch.iter().all(|ts| ts.len() == n),
        "context sets must be of the same size, got {:?}",
        batch.iter().map(|ts| ts.len()).collect::<Vec<_>>()
    );

    let data = batch
        .iter()
        .flat_map(|ts| ts.iter().flat_map(|t| t.to_context()))
        .collect::<Vec<_>>();
    Ok(Tensor::from_vec(data, (n_tasks, n, dim), device)?)
}

/// Transitions of a meta batch, flattened over tasks.
///
/// Each tensor has `tasks * n` rows, rows of a task being contiguous.
pub struct TransitionBatch {
    /// Observations.
    pub obs: Tensor,

    /// Actions.
    pub act: Tensor,

    /// Rewards, shape `(tasks * n, 1)`.
    pub reward: Tensor,

    /// Next observations.
    pub next_obs: Tensor,

    /// `1` for terminal transitions, shape `(tasks * n, 1)`.
    pub done: Tensor,
}

impl TransitionBatch {
    /// Creates tensors from transitions of each task.
    pub fn from_transitions(batch: &[Vec<Transition>], device: &Device) -> Result<Self> {
        let first = batch
            .first()
            .and_then(|ts| ts.first())
            .ok_or(MetaRlError::EmptyContext)?;
        let (obs_dim, act_dim) = (first.obs.len(), first.act.len());
        let transitions = batch.iter().flat_map(|ts| ts.iter()).collect::<Vec<_>>();
        let n = transitions.len();

        let stack = |f: &dyn Fn(&Transition) -> Vec<f32>, dim: usize| -> Result<Tensor> {
            let data = transitions.iter().flat_map(|t| f(t)).collect::<Vec<_>>();
            Ok(Tensor::from_vec(data, (n, dim), device)?)
        };

        Ok(Self {
            obs: stack(&|t| t.obs.clone(), obs_dim)?,
            act: stack(&|t| t.act.clone(), act_dim)?,
            reward: stack(&|t| vec![t.reward], 1)?,
            next_obs: stack(&|t| t.next_obs.clone(), obs_dim)?,
            done: stack(&|t| vec![t.is_done as i32 as f32], 1)?,
        })
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.reward.dims()[0]
    }

    /// Returns `true` if the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Repeats each row of `z`, shape `(tasks, latent)`, `n` times.
pub fn repeat_rows(z: &Tensor, n: usize) -> Result<Tensor> {
    let (n_tasks, dim) = z.dims2()?;
    let z = z
        .unsqueeze(1)?
        .broadcast_as((n_tasks, n, dim))?
        .contiguous()?
        .reshape((n_tasks * n, dim))?;
    Ok(z)
}

/// Converts a scalar tensor into `f32`.
pub fn to_f32(t: &Tensor) -> Result<f32> {
    Ok(t.flatten_all()?.mean(D::Minus1)?.to_scalar::<f32>()?)
}
