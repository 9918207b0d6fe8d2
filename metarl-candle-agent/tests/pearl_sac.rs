use anyhow::Result;
use candle_core::Tensor;
use candle_nn::VarMap;
use metarl_candle_agent::pearl::{EntCoefMode, PearlSac, PearlSacConfig};
use metarl_core::{
    dummy::{DummyBuffer, DummyEnv, DummyEnvConfig},
    record::BufferedRecorder,
    ContextualPolicy, Env, MetaAgent, MetaLearner, MetaLearnerConfig, MultiTaskBuffer, Policy,
    Sampler, TaskSplit, Transition,
};

const TAU: f64 = 0.05;

fn agent() -> Result<PearlSac> {
    let config = PearlSacConfig::default()
        .dims(1, 1)
        .latent_dim(2)
        .units(vec![16, 16, 16])
        .tau(TAU)
        .seed(42);
    PearlSac::build(config)
}

fn env() -> Result<DummyEnv> {
    DummyEnv::build(&DummyEnvConfig::default().episode_len(8), 0)
}

fn var(varmap: &VarMap, name: &str) -> Tensor {
    varmap.data().lock().unwrap()[name].as_tensor().copy().unwrap()
}

fn max_abs_diff(a: &Tensor, b: &Tensor) -> Result<f32> {
    Ok((a - b)?.abs()?.max_all()?.to_scalar::<f32>()?)
}

/// Collects transitions on each task with the agent acting from the prior.
fn collect(agent: &mut PearlSac, env: &mut DummyEnv, tasks: &[usize]) -> Result<DummyBuffer> {
    let sampler = Sampler::new(8);
    let mut buffer = DummyBuffer::default();
    for &task in tasks.iter() {
        env.reset_task(task)?;
        agent.clear_z()?;
        let (trajs, _) = sampler.obtain_samples(env, agent, 16, false, false)?;
        buffer.add_trajs(task, &trajs)?;
    }
    Ok(buffer)
}

fn meta_batch(buffer: &mut DummyBuffer, tasks: &[usize], n: usize) -> Result<Vec<Vec<Transition>>> {
    tasks.iter().map(|&task| buffer.sample(task, n)).collect()
}

#[test]
fn test_act_with_context() -> Result<()> {
    let mut agent = agent()?;
    let mut env = env()?;
    env.reset_task(2)?;
    agent.clear_z()?;

    let act = agent.sample(&[0.0])?;
    assert_eq!(act.len(), 1);
    assert!(act[0].abs() <= 1.0);

    // No context yet.
    assert!(agent.infer_posterior().is_err());

    let traj = Sampler::new(8).rollout(&mut env, &mut agent, true)?;
    assert_eq!(traj.len(), 8);
    assert_eq!(agent.encoder().context().unwrap().dims(), [1, 8, 3]);
    agent.infer_posterior()?;
    assert_eq!(agent.encoder().z().dims(), [1, 2]);

    agent.set_deterministic(true);
    let a1 = agent.sample(&[0.3])?;
    let a2 = agent.sample(&[0.3])?;
    assert_eq!(a1, a2);
    Ok(())
}

#[test]
fn test_train_model() -> Result<()> {
    let mut agent = agent()?;
    let mut env = env()?;
    let tasks = [0, 1, 3];
    let mut buffer = collect(&mut agent, &mut env, &tasks)?;

    let (qf1, _) = agent.critics();
    let (qf1_tgt, _) = agent.target_critics();
    let name = "qf.mlp.ln0.weight";
    let w_tgt_old = var(qf1_tgt.get_varmap(), name);
    assert_eq!(max_abs_diff(&w_tgt_old, &var(qf1.get_varmap(), name))?, 0.0);
    let enc_old = var(agent.encoder().varmap(), "encoder.mlp.ln0.weight");

    let context = meta_batch(&mut buffer, &tasks, 10)?;
    let transitions = meta_batch(&mut buffer, &tasks, 12)?;
    let record = agent.train_model(&context, &transitions)?;

    for key in [
        "policy_loss",
        "qf1_loss",
        "qf2_loss",
        "encoder_loss",
        "alpha_loss",
        "alpha",
        "z_mean",
        "z_var",
    ]
    .iter()
    {
        assert!(record.get_scalar(key)?.is_finite(), "{}", key);
    }
    assert!(record.get_scalar("encoder_loss")? >= 0.0);
    assert!(record.get_scalar("z_var")? > 0.0);
    assert_eq!(agent.n_opts(), 1);

    // Target critics follow the critics by the soft update.
    let (qf1, _) = agent.critics();
    let (qf1_tgt, _) = agent.target_critics();
    let w = var(qf1.get_varmap(), name);
    let w_tgt = var(qf1_tgt.get_varmap(), name);
    let expected = ((TAU * &w)? + ((1.0 - TAU) * &w_tgt_old)?)?;
    assert!(max_abs_diff(&w_tgt, &expected)? < 1e-6);
    assert!(max_abs_diff(&w, &w_tgt_old)? > 0.0);

    // The encoder is trained through the critic loss and the KL term.
    let enc = var(agent.encoder().varmap(), "encoder.mlp.ln0.weight");
    assert!(max_abs_diff(&enc, &enc_old)? > 0.0);

    // The posterior is reset for acting on a single task.
    assert_eq!(agent.encoder().z().dims(), [1, 2]);
    Ok(())
}

#[test]
fn test_train_model_rejects_mismatched_batches() -> Result<()> {
    let mut agent = agent()?;
    let mut env = env()?;
    let tasks = [0, 1];
    let mut buffer = collect(&mut agent, &mut env, &tasks)?;

    let context = meta_batch(&mut buffer, &tasks, 4)?;
    let transitions = meta_batch(&mut buffer, &tasks[..1], 4)?;
    assert!(agent.train_model(&context, &transitions).is_err());
    assert!(agent.train_model(&[], &[]).is_err());

    // Context sets of different sizes.
    let mut context = meta_batch(&mut buffer, &tasks, 4)?;
    context[0].truncate(3);
    let transitions = meta_batch(&mut buffer, &tasks, 4)?;
    assert!(agent.train_model(&context, &transitions).is_err());
    Ok(())
}

#[test]
fn test_fixed_entropy_coefficient() -> Result<()> {
    let config = PearlSacConfig::default()
        .dims(1, 1)
        .latent_dim(2)
        .units(vec![8, 8, 8])
        .ent_coef_mode(EntCoefMode::Fix(0.1));
    let mut agent = PearlSac::build(config)?;
    let mut env = env()?;
    let tasks = [2, 3];
    let mut buffer = collect(&mut agent, &mut env, &tasks)?;

    let context = meta_batch(&mut buffer, &tasks, 4)?;
    let transitions = meta_batch(&mut buffer, &tasks, 4)?;
    let record = agent.train_model(&context, &transitions)?;
    assert_eq!(record.get_scalar("alpha_loss")?, 0.0);
    assert!((record.get_scalar("alpha")? - 0.1).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_meta_train_with_pearl_sac() -> Result<()> {
    let mut env = env()?;
    let tasks = TaskSplit::new(&env.get_all_task_idx(), 3, 1)?;
    let config = MetaLearnerConfig::default()
        .num_iterations(2)
        .num_sample_tasks(2)
        .num_samples(16, 8, 8)
        .num_meta_grads(2)
        .meta_batch_size(2)
        .batch_size(8)
        .max_step(8)
        .num_adapt_rollouts(2);
    let mut learner = MetaLearner::new(config, tasks)?;
    let mut agent = agent()?;
    let mut rl_buffer = DummyBuffer::default();
    let mut enc_buffer = DummyBuffer::default();
    let mut recorder = BufferedRecorder::new();

    learner.meta_train(
        &mut env,
        &mut agent,
        &mut rl_buffer,
        &mut enc_buffer,
        &mut recorder,
    )?;

    assert_eq!(agent.n_opts(), 4);
    assert!(agent.is_train());
    let records: Vec<_> = recorder.iter().collect();
    assert_eq!(records.len(), 4);
    assert!(records[0].get_scalar("qf1_loss")?.is_finite());
    assert_eq!(records[1].get_array1("return_curve")?.len(), 2);
    Ok(())
}
