use super::{Actor, Critic, EntCoef, PearlSacConfig};
use crate::{
    encoder::MlpEncoder,
    util::{context_tensor, repeat_rows, to_f32, track, TransitionBatch},
};
use anyhow::{ensure, Result};
use candle_core::{Device, Tensor};
use candle_nn::loss::mse;
use log::{info, trace, warn};
use metarl_core::{
    record::{Record, RecordValue},
    ContextualPolicy, MetaAgent, Policy, Transition,
};
use std::convert::TryFrom;

/// Soft actor-critic agent conditioned on the latent task variable of PEARL.
///
/// When acting, the agent keeps the posterior of a single task. In
/// [`MetaAgent::train_model`], the posterior is inferred for all tasks of the
/// meta batch.
pub struct PearlSac {
    encoder: MlpEncoder,
    pi: Actor,
    qf1: Critic,
    qf2: Critic,
    qf1_tgt: Critic,
    qf2_tgt: Critic,
    ent_coef: EntCoef,
    gamma: f64,
    tau: f64,
    kl_lambda: f64,
    reward_scale: f64,
    train: bool,
    n_opts: usize,
    device: Device,
}

impl PearlSac {
    /// Constructs [`PearlSac`] agent.
    pub fn build(config: PearlSacConfig) -> Result<Self> {
        let device = Device::try_from(config.device)?;
        if let Some(seed) = config.seed {
            if let Err(e) = device.set_seed(seed) {
                warn!("Failed to set seed {}: {}", seed, e);
            }
        }

        let encoder = MlpEncoder::build(config.encoder_config(), device.clone())?;
        let pi = Actor::build(config.policy_config(), &config.policy_opt_config, &device)?;
        let qf1 = Critic::build(config.qf_config(), &config.qf_opt_config, &device)?;
        let qf2 = Critic::build(config.qf_config(), &config.qf_opt_config, &device)?;
        let qf1_tgt = Critic::build(config.qf_config(), &config.qf_opt_config, &device)?;
        let qf2_tgt = Critic::build(config.qf_config(), &config.qf_opt_config, &device)?;
        track(qf1_tgt.get_varmap(), qf1.get_varmap(), 1.0)?;
        track(qf2_tgt.get_varmap(), qf2.get_varmap(), 1.0)?;
        let ent_coef = EntCoef::new(config.ent_coef_mode.clone(), config.action_dim, &device)?;

        info!(
            "PEARL agent: observ_dim = {}, action_dim = {}, latent_dim = {}, units = {:?}",
            config.observ_dim, config.action_dim, config.latent_dim, config.units
        );

        Ok(Self {
            encoder,
            pi,
            qf1,
            qf2,
            qf1_tgt,
            qf2_tgt,
            ent_coef,
            gamma: config.gamma,
            tau: config.tau,
            kl_lambda: config.kl_lambda,
            reward_scale: config.reward_scale,
            train: true,
            n_opts: 0,
            device,
        })
    }

    /// Context encoder.
    pub fn encoder(&self) -> &MlpEncoder {
        &self.encoder
    }

    /// The number of optimization steps.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Target critics.
    pub fn target_critics(&self) -> (&Critic, &Critic) {
        (&self.qf1_tgt, &self.qf2_tgt)
    }

    /// Critics.
    pub fn critics(&self) -> (&Critic, &Critic) {
        (&self.qf1, &self.qf2)
    }

    fn min_q(q1: &Critic, q2: &Critic, obs: &Tensor, act: &Tensor, z: &Tensor) -> Result<Tensor> {
        let q1 = q1.forward(obs, act, z)?;
        let q2 = q2.forward(obs, act, z)?;
        Ok(q1.minimum(&q2)?)
    }

    /// Soft update of the target critics.
    fn soft_update(&mut self) -> Result<()> {
        track(self.qf1_tgt.get_varmap(), self.qf1.get_varmap(), self.tau)?;
        track(self.qf2_tgt.get_varmap(), self.qf2.get_varmap(), self.tau)?;
        Ok(())
    }

    fn train_model_(
        &mut self,
        context_batch: &[Vec<Transition>],
        transition_batch: &[Vec<Transition>],
    ) -> Result<Record> {
        let n_tasks = context_batch.len();
        ensure!(
            n_tasks == transition_batch.len(),
            "meta batch sizes differ: {} contexts, {} transition sets",
            n_tasks,
            transition_batch.len()
        );
        let n = transition_batch.first().map_or(0, |ts| ts.len());
        ensure!(
            n > 0 && transition_batch.iter().all(|ts| ts.len() == n),
            "transition sets must be non-empty and of the same size"
        );

        let context = context_tensor(context_batch, &self.device)?;
        let batch = TransitionBatch::from_transitions(transition_batch, &self.device)?;

        trace!("infer_posterior()");
        self.encoder.clear_z(n_tasks)?;
        self.encoder.infer_posterior(&context)?;
        let task_z = repeat_rows(self.encoder.z(), n)?;
        let task_z_detached = task_z.detach();

        trace!("update_critic()");
        let (qf1_loss, qf2_loss, encoder_loss) = {
            let tgt = {
                let (next_act, next_log_prob) = self.pi.rsample(&batch.next_obs, &task_z_detached)?;
                let min_q = Self::min_q(
                    &self.qf1_tgt,
                    &self.qf2_tgt,
                    &batch.next_obs,
                    &next_act,
                    &task_z_detached,
                )?;
                let v = (min_q - self.ent_coef.alpha()?.broadcast_mul(&next_log_prob)?)?;
                let not_done = (1.0 - &batch.done)?;
                ((&batch.reward * self.reward_scale)? + ((not_done * v)? * self.gamma)?)?
            }
            .detach();

            let q1 = self.qf1.forward(&batch.obs, &batch.act, &task_z)?;
            let q2 = self.qf2.forward(&batch.obs, &batch.act, &task_z)?;
            let qf1_loss = mse(&q1, &tgt)?;
            let qf2_loss = mse(&q2, &tgt)?;
            let encoder_loss = (self.encoder.compute_kl_div()? * self.kl_lambda)?;

            let loss = ((&qf1_loss + &qf2_loss)? + &encoder_loss)?;
            let grads = loss.backward()?;
            self.qf1.step(&grads)?;
            self.qf2.step(&grads)?;
            self.encoder.step(&grads)?;

            (qf1_loss, qf2_loss, encoder_loss)
        };

        trace!("update_actor()");
        let (policy_loss, log_prob) = {
            let (act, log_prob) = self.pi.rsample(&batch.obs, &task_z_detached)?;
            let min_q = Self::min_q(&self.qf1, &self.qf2, &batch.obs, &act, &task_z_detached)?;
            let alpha = self.ent_coef.alpha()?;
            let loss = (alpha.broadcast_mul(&log_prob)? - min_q)?.mean_all()?;
            self.pi.backward_step(&loss)?;
            (loss, log_prob)
        };

        trace!("update_ent_coef()");
        let alpha_loss = self.ent_coef.update(&log_prob)?.unwrap_or(0.0);

        trace!("soft_update()");
        self.soft_update()?;
        self.n_opts += 1;

        Ok(Record::from_slice(&[
            ("policy_loss", RecordValue::Scalar(to_f32(&policy_loss)?)),
            ("qf1_loss", RecordValue::Scalar(to_f32(&qf1_loss)?)),
            ("qf2_loss", RecordValue::Scalar(to_f32(&qf2_loss)?)),
            ("encoder_loss", RecordValue::Scalar(to_f32(&encoder_loss)?)),
            ("alpha_loss", RecordValue::Scalar(alpha_loss)),
            ("alpha", RecordValue::Scalar(to_f32(&self.ent_coef.alpha()?)?)),
            ("z_mean", RecordValue::Scalar(to_f32(self.encoder.z_mean())?)),
            ("z_var", RecordValue::Scalar(to_f32(self.encoder.z_var())?)),
        ]))
    }
}

impl Policy for PearlSac {
    /// Samples an action with `z` of the current posterior.
    fn sample(&mut self, obs: &[f32]) -> Result<Vec<f32>> {
        let obs = Tensor::from_slice(obs, (1, obs.len()), &self.device)?;
        let z = self.encoder.detached_z();
        let (act, _) = self.pi.forward(&obs, &z)?;
        Ok(act.squeeze(0)?.to_vec1::<f32>()?)
    }
}

impl ContextualPolicy for PearlSac {
    fn clear_z(&mut self) -> Result<()> {
        self.encoder.clear_z(1)
    }

    fn update_context(&mut self, transition: &Transition) -> Result<()> {
        self.encoder.update_context(transition)
    }

    fn infer_posterior(&mut self) -> Result<()> {
        self.encoder.infer_posterior_from_context()
    }

    fn set_deterministic(&mut self, v: bool) {
        self.pi.set_deterministic(v);
    }
}

impl MetaAgent for PearlSac {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn train_model(
        &mut self,
        context_batch: &[Vec<Transition>],
        transition_batch: &[Vec<Transition>],
    ) -> Result<Record> {
        let record = self.train_model_(context_batch, transition_batch)?;
        // Acting uses the posterior of a single task.
        self.encoder.clear_z(1)?;
        Ok(record)
    }
}
