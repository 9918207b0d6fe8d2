use clap::Parser;

/// Build a PEARL agent on a HalfCheetah task family
#[derive(Clone, Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Task family, "dir" (cheetah-dir) or "vel" (cheetah-vel).
    #[arg(long, default_value = "dir")]
    pub env: String,

    /// Index of the GPU. The CPU is used if CUDA is not available.
    #[arg(long, default_value_t = 0)]
    pub gpu_index: usize,

    /// YAML file of the configuration, overriding the preset of `--env`.
    #[arg(long)]
    pub config: Option<String>,

    /// Writes the configuration to a YAML file.
    #[arg(long)]
    pub dump_config: Option<String>,
}
