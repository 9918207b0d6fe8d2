use anyhow::Result;
use metarl_core::{
    dummy::{DummyBuffer, DummyEnv, DummyEnvConfig, DummyPolicy},
    error::MetaRlError,
    record::{BufferedRecorder, Recorder},
    Env, MetaAgent, MetaLearner, MetaLearnerConfig, MultiTaskBuffer, TaskSplit,
};

fn config() -> MetaLearnerConfig {
    MetaLearnerConfig::default()
        .num_iterations(2)
        .num_sample_tasks(2)
        .num_samples(10, 5, 5)
        .num_meta_grads(3)
        .meta_batch_size(2)
        .batch_size(4)
        .max_step(5)
        .num_adapt_rollouts(2)
        .eval_interval(1)
}

fn env() -> Result<DummyEnv> {
    DummyEnv::build(&DummyEnvConfig::default().episode_len(5), 0)
}

#[test]
fn test_meta_train() -> Result<()> {
    let mut env = env()?;
    let tasks = TaskSplit::new(&env.get_all_task_idx(), 3, 1)?;
    let mut learner = MetaLearner::new(config(), tasks)?;
    let mut agent = DummyPolicy::default();
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

    assert_eq!(learner.n_iters(), 2);
    assert_eq!(learner.n_train_steps(), 6);
    assert_eq!(agent.n_train_model, 6);
    assert!(agent.meta_batch_sizes.iter().all(|&n| n == 2));
    assert!(agent.is_train());
    assert!(!agent.is_deterministic);

    // Initial samples are collected on every training task, never on the evaluation task.
    for task in 0..3 {
        assert!(rl_buffer.len(task) >= 10);
    }
    assert_eq!(rl_buffer.len(3), 0);
    assert_eq!(enc_buffer.len(3), 0);

    // A flushed record and a meta-test record per iteration.
    assert_eq!(recorder.len(), 4);
    let records: Vec<_> = recorder.iter().collect();
    assert_eq!(records[0].get_scalar("policy_loss")?, 1.0);
    assert_eq!(records[0].get_scalar("step")?, 1.0);
    assert_eq!(records[1].get_scalar("iteration")?, 1.0);
    assert!(records[1].get("datetime").is_some());
    assert_eq!(records[3].get_scalar("iteration")?, 2.0);

    Ok(())
}

#[test]
fn test_meta_test() -> Result<()> {
    let mut env = env()?;
    let tasks = TaskSplit::new(&env.get_all_task_idx(), 3, 2)?;
    let learner = MetaLearner::new(config(), tasks)?;
    let mut agent = DummyPolicy::default();

    let result = learner.meta_test(&mut env, &mut agent)?;

    // The deterministic dummy policy stays at the origin, so each step costs the
    // distance to the goals 0.5 and 1.0.
    assert_eq!(result.returns, vec![-2.5, -5.0]);
    assert_eq!(result.curve, vec![-3.75, -3.75]);
    assert_eq!(result.mean_return(), -3.75);

    // Two evaluation tasks with two adaptation rollouts each.
    assert_eq!(agent.n_clear_z, 2);
    assert_eq!(agent.n_posterior_updates, 4);
    assert_eq!(agent.context.len(), 10);

    let record = result.to_record();
    assert_eq!(record.get_array1("return_eval")?, vec![-2.5, -5.0]);

    Ok(())
}

#[test]
fn test_sample_meta_batch_is_distinct() -> Result<()> {
    let env = env()?;
    let tasks = TaskSplit::new(&env.get_all_task_idx(), 4, 1)?;
    let mut learner = MetaLearner::new(config().meta_batch_size(3), tasks)?;

    for _ in 0..20 {
        let mut batch = learner.sample_meta_batch();
        assert_eq!(batch.len(), 3);
        batch.sort_unstable();
        batch.dedup();
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|&t| t < 4));
    }

    Ok(())
}

#[test]
fn test_meta_batch_larger_than_train_tasks() -> Result<()> {
    let env = env()?;
    let tasks = TaskSplit::new(&env.get_all_task_idx(), 2, 1)?;
    assert!(MetaLearner::new(config().meta_batch_size(3), tasks).is_err());
    Ok(())
}

#[test]
fn test_no_train_tasks() -> Result<()> {
    let env = env()?;
    let tasks = TaskSplit::new(&env.get_all_task_idx(), 0, 1)?;
    let config = config().meta_batch_size(0).num_iterations(1);
    let err = MetaLearner::new(config, tasks).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<MetaRlError>(),
        Some(MetaRlError::InsufficientTasks { available: 0, .. })
    ));
    Ok(())
}

#[test]
fn test_invalid_config() -> Result<()> {
    let env = env()?;
    let tasks = TaskSplit::new(&env.get_all_task_idx(), 2, 1)?;
    assert!(MetaLearner::new(config().max_step(0), tasks.clone()).is_err());
    assert!(MetaLearner::new(config().meta_batch_size(0), tasks).is_err());
    Ok(())
}

#[test]
fn test_collect_data_unknown_task() -> Result<()> {
    let mut env = env()?;
    let tasks = TaskSplit::new(&env.get_all_task_idx(), 2, 1)?;
    let learner = MetaLearner::new(config(), tasks)?;
    let mut agent = DummyPolicy::default();
    let mut buffer = DummyBuffer::default();

    let res = learner.collect_data(&mut env, &mut agent, 10, 5, false, &mut buffer, None);
    assert!(res.is_err());
    Ok(())
}

#[test]
fn test_null_recorder_is_a_recorder() {
    fn write_to(recorder: &mut dyn Recorder) {
        recorder.store(metarl_core::record::Record::from_scalar("x", 1.0));
        recorder.flush(0);
    }
    write_to(&mut metarl_core::record::NullRecorder::default());
}
