mod args;
use anyhow::{bail, Result};
use args::Args;
use clap::Parser;
use log::info;
use metarl::PearlConfig;
use metarl_candle_agent::{pearl::PearlSac, Device};
use metarl_core::MetaLearner;

fn config(args: &Args) -> Result<PearlConfig> {
    if let Some(path) = &args.config {
        info!("Load configuration from {}", path);
        return PearlConfig::load(path);
    }
    match args.env.as_str() {
        "dir" => Ok(PearlConfig::cheetah_dir()),
        "vel" => Ok(PearlConfig::cheetah_vel()),
        env => bail!("unknown env: {}, expected dir or vel", env),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = config(&args)?;

    if let Some(path) = &args.dump_config {
        config.save(path)?;
        info!("Save configuration to {}", path);
    }

    let device = Device::cuda_if_available(args.gpu_index);
    info!("Device: {:?}", device);

    let tasks = config.task_split()?;
    info!(
        "{}: {} training tasks, {} evaluation tasks",
        config.env_name,
        tasks.train().len(),
        tasks.eval().len()
    );

    let agent_config = config.agent_config(device);
    let encoder_config = agent_config.encoder_config();
    info!(
        "Encoder: {} -> {:?} -> {} (latent_dim = {})",
        encoder_config.in_dim,
        encoder_config.units,
        encoder_config.out_dim(),
        encoder_config.latent_dim
    );
    let agent = PearlSac::build(agent_config)?;
    info!("Agent built, z has {} dimensions", agent.encoder().latent_dim());

    let learner = MetaLearner::new(config.pearl_params.clone(), tasks)?;
    info!(
        "Meta-learner ready at iteration {}: {} iterations, meta batch of {} tasks",
        learner.n_iters(),
        config.pearl_params.num_iterations,
        config.pearl_params.meta_batch_size
    );
    info!(
        "Meta-training needs an environment implementing metarl_core::Env for {}",
        config.env_name
    );

    Ok(())
}
