use super::MlpEncoderConfig;
use crate::{
    mlp::Mlp,
    model::SubModel1,
    opt::Optimizer,
    util::{kl_std_normal, softplus},
};
use anyhow::Result;
use candle_core::{backprop::GradStore, DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use log::trace;
use metarl_core::{error::MetaRlError, Transition};

/// Lower bound of variances of Gaussian factors.
const MIN_VAR: f64 = 1e-7;

/// Context encoder with a posterior over the latent task variable.
///
/// The posterior is kept for a batch of tasks: `z_mean` and `z_var` have shape
/// `(tasks, latent_dim)`, as does the sampled `z`.
pub struct MlpEncoder {
    config: MlpEncoderConfig,
    device: Device,
    varmap: VarMap,
    net: Mlp,
    opt: Optimizer,
    z_mean: Tensor,
    z_var: Tensor,
    task_z: Tensor,
    context: Option<Tensor>,
}

impl MlpEncoder {
    /// Constructs [`MlpEncoder`] with the posterior set to the prior for a single task.
    pub fn build(config: MlpEncoderConfig, device: Device) -> Result<Self> {
        let varmap = VarMap::new();
        let net = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Mlp::build(vb.pp("encoder"), config.mlp_config())?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;
        let (z_mean, z_var) = prior(1, config.latent_dim, &device)?;
        let task_z = z_mean.clone();

        let mut encoder = Self {
            config,
            device,
            varmap,
            net,
            opt,
            z_mean,
            z_var,
            task_z,
            context: None,
        };
        encoder.sample_z()?;

        Ok(encoder)
    }

    /// Resets the posterior to the prior `N(0, I)` for `num_tasks` tasks, samples
    /// a new `z` from it and drops the context collected so far.
    pub fn clear_z(&mut self, num_tasks: usize) -> Result<()> {
        let (z_mean, z_var) = prior(num_tasks, self.config.latent_dim, &self.device)?;
        self.z_mean = z_mean;
        self.z_var = z_var;
        self.sample_z()?;
        self.context = None;
        Ok(())
    }

    /// Samples `z` from the current posterior with the reparameterization trick.
    pub fn sample_z(&mut self) -> Result<()> {
        let eps = self.z_mean.randn_like(0.0, 1.0)?;
        self.task_z = (&self.z_mean + (self.z_var.sqrt()? * eps)?)?;
        Ok(())
    }

    /// Fuses Gaussian factors along the second last dimension.
    ///
    /// Variances are clamped to at least `1e-7`. Returns `(mean, var)` with
    /// `var = 1 / Σ 1/var_i` and `mean = var · Σ mean_i/var_i`.
    pub fn product_of_gaussians(mean: &Tensor, var: &Tensor) -> Result<(Tensor, Tensor)> {
        let var = var.maximum(MIN_VAR)?;
        let pog_var = var.recip()?.sum(D::Minus2)?.recip()?;
        let pog_mean = (&pog_var * (mean / &var)?.sum(D::Minus2)?)?;
        Ok((pog_mean, pog_var))
    }

    /// Computes the posterior `q(z | c)` from a context of shape
    /// `(tasks, n, in_dim)` and samples a new `z` from it.
    pub fn infer_posterior(&mut self, context: &Tensor) -> Result<()> {
        let (n_tasks, n, _) = context.dims3()?;
        if n == 0 {
            return Err(MetaRlError::EmptyContext.into());
        }
        let latent_dim = self.config.latent_dim;
        let params = self.net.forward(context)?;
        let mean = params.narrow(D::Minus1, 0, latent_dim)?;
        let var = softplus(&params.narrow(D::Minus1, latent_dim, latent_dim)?)?;

        let (z_mean, z_var) = Self::product_of_gaussians(&mean, &var)?;
        debug_assert_eq!(z_mean.dims(), [n_tasks, latent_dim]);
        self.z_mean = z_mean;
        self.z_var = z_var;
        self.sample_z()?;
        trace!("Inferred posterior of {} tasks from {} transitions", n_tasks, n);

        Ok(())
    }

    /// Infers the posterior from the accumulated context.
    pub fn infer_posterior_from_context(&mut self) -> Result<()> {
        let context = self.context.clone().ok_or(MetaRlError::EmptyContext)?;
        self.infer_posterior(&context)
    }

    /// `KL(q(z | c) || N(0, I))` summed over tasks and latent dimensions.
    pub fn compute_kl_div(&self) -> Result<Tensor> {
        Ok(kl_std_normal(&self.z_mean, &self.z_var)?.sum_all()?)
    }

    /// Appends `(obs, act, reward)` of a transition to the context.
    pub fn update_context(&mut self, transition: &Transition) -> Result<()> {
        let data = transition.to_context();
        let dim = data.len();
        let t = Tensor::from_vec(data, (1, 1, dim), &self.device)?;
        self.context = Some(match self.context.take() {
            None => t,
            Some(context) => Tensor::cat(&[&context, &t], 1)?,
        });
        Ok(())
    }

    /// Accumulated context of shape `(1, n, in_dim)`.
    pub fn context(&self) -> Option<&Tensor> {
        self.context.as_ref()
    }

    /// Sampled latent task variable of shape `(tasks, latent_dim)`.
    pub fn z(&self) -> &Tensor {
        &self.task_z
    }

    /// Sampled latent task variable cut off from the computation graph.
    pub fn detached_z(&self) -> Tensor {
        self.task_z.detach()
    }

    /// Means of the posterior.
    pub fn z_mean(&self) -> &Tensor {
        &self.z_mean
    }

    /// Variances of the posterior.
    pub fn z_var(&self) -> &Tensor {
        &self.z_var
    }

    /// Dimension of the latent task variable.
    pub fn latent_dim(&self) -> usize {
        self.config.latent_dim
    }

    /// Updates the parameters with gradients computed beforehand.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        self.opt.step(grads)
    }

    /// Variables of the network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }
}

fn prior(num_tasks: usize, latent_dim: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let mean = Tensor::zeros((num_tasks, latent_dim), DType::F32, device)?;
    let var = Tensor::ones((num_tasks, latent_dim), DType::F32, device)?;
    Ok((mean, var))
}

#[cfg(test)]
mod test {
    use super::*;

    fn encoder() -> Result<MlpEncoder> {
        let config = MlpEncoderConfig::default()
            .in_dim(3, 2)
            .latent_dim(4)
            .units(vec![32, 32, 32]);
        MlpEncoder::build(config, Device::Cpu)
    }

    fn transition(x: f32) -> Transition {
        Transition {
            obs: vec![x; 3],
            act: vec![0.1, -0.1],
            reward: x,
            next_obs: vec![x + 1.0; 3],
            is_done: false,
        }
    }

    #[test]
    fn test_clear_z_resets_to_prior() -> Result<()> {
        let mut encoder = encoder()?;
        encoder.update_context(&transition(1.0))?;
        encoder.clear_z(3)?;

        assert!(encoder.context().is_none());
        assert_eq!(encoder.z().dims(), [3, 4]);
        assert_eq!(encoder.z_mean().sum_all()?.to_scalar::<f32>()?, 0.0);
        assert_eq!(encoder.z_var().to_vec2::<f32>()?, vec![vec![1.0; 4]; 3]);
        assert_eq!(encoder.compute_kl_div()?.to_scalar::<f32>()?, 0.0);
        Ok(())
    }

    #[test]
    fn test_product_of_gaussians() -> Result<()> {
        let mean = Tensor::new(&[[1f32], [3.0]], &Device::Cpu)?;
        let var = Tensor::new(&[[1f32], [1.0]], &Device::Cpu)?;
        let (m, v) = MlpEncoder::product_of_gaussians(&mean, &var)?;
        assert_eq!(m.to_vec1::<f32>()?, vec![2.0]);
        assert_eq!(v.to_vec1::<f32>()?, vec![0.5]);

        // Precision weighting.
        let var = Tensor::new(&[[1f32], [3.0]], &Device::Cpu)?;
        let (m, v) = MlpEncoder::product_of_gaussians(&mean, &var)?;
        assert!((v.to_vec1::<f32>()?[0] - 0.75).abs() < 1e-6);
        assert!((m.to_vec1::<f32>()?[0] - 1.5).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_product_of_single_gaussian() -> Result<()> {
        let mean = Tensor::new(&[[0.3f32, -2.0]], &Device::Cpu)?;
        let var = Tensor::new(&[[0.5f32, 4.0]], &Device::Cpu)?;
        let (m, v) = MlpEncoder::product_of_gaussians(&mean, &var)?;
        let (m, v) = (m.to_vec1::<f32>()?, v.to_vec1::<f32>()?);
        assert!((m[0] - 0.3).abs() < 1e-6 && (m[1] + 2.0).abs() < 1e-6);
        assert!((v[0] - 0.5).abs() < 1e-6 && (v[1] - 4.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_product_of_gaussians_clamps_variance() -> Result<()> {
        let mean = Tensor::new(&[[5f32], [-1.0]], &Device::Cpu)?;
        let var = Tensor::new(&[[0f32], [1.0]], &Device::Cpu)?;
        let (m, v) = MlpEncoder::product_of_gaussians(&mean, &var)?;
        let (m, v) = (m.to_vec1::<f32>()?[0], v.to_vec1::<f32>()?[0]);
        assert!(v.is_finite() && v > 0.0 && v <= 1e-7);
        assert!((m - 5.0).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn test_posterior_variance_bounded_by_factors() -> Result<()> {
        let mean = Tensor::randn(0f32, 1f32, (2, 10, 3), &Device::Cpu)?;
        let var = (Tensor::rand(0f32, 1f32, (2, 10, 3), &Device::Cpu)? + 0.1)?;
        let (_, v) = MlpEncoder::product_of_gaussians(&mean, &var)?;
        let min_var = var.min(1)?;
        let excess = (v - min_var)?.max_all()?.to_scalar::<f32>()?;
        assert!(excess <= 0.0);
        Ok(())
    }

    #[test]
    fn test_infer_posterior() -> Result<()> {
        let mut encoder = encoder()?;
        let context = Tensor::randn(0f32, 1f32, (3, 7, 6), &Device::Cpu)?;
        encoder.clear_z(3)?;
        encoder.infer_posterior(&context)?;

        assert_eq!(encoder.z_mean().dims(), [3, 4]);
        assert_eq!(encoder.z_var().dims(), [3, 4]);
        assert_eq!(encoder.z().dims(), [3, 4]);
        let kl = encoder.compute_kl_div()?.to_scalar::<f32>()?;
        assert!(kl.is_finite() && kl >= 0.0);

        // The KL term trains the encoder.
        let grads = encoder.compute_kl_div()?.backward()?;
        let n_grads = encoder
            .varmap()
            .all_vars()
            .iter()
            .filter(|v| grads.get(v.as_tensor()).is_some())
            .count();
        assert!(n_grads > 0);
        encoder.step(&grads)?;
        Ok(())
    }

    #[test]
    fn test_accumulated_context() -> Result<()> {
        let mut encoder = encoder()?;
        assert!(encoder.infer_posterior_from_context().is_err());

        for i in 0..5 {
            encoder.update_context(&transition(i as f32))?;
        }
        let context = encoder.context().unwrap();
        assert_eq!(context.dims(), [1, 5, 6]);
        assert_eq!(context.get(0)?.get(4)?.to_vec1::<f32>()?[5], 4.0);

        encoder.infer_posterior_from_context()?;
        assert_eq!(encoder.z().dims(), [1, 4]);
        assert_eq!(encoder.detached_z().dims(), [1, 4]);
        Ok(())
    }
}
