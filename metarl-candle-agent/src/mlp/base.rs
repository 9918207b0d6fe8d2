use super::MlpConfig;
use crate::{model::SubModel1, util::uniform_linear};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor, D};
use candle_nn::{linear, Linear, Module, VarBuilder};

/// Returns hidden layers and the output layer.
fn create_layers(vb: VarBuilder, config: &MlpConfig) -> Result<(Vec<Linear>, Linear)> {
    let last_unit = *config.units.last().context("units of Mlp are empty")?;
    let mut in_out_pairs: Vec<(usize, usize)> = (0..config.units.len() - 1)
        .map(|i| (config.units[i], config.units[i + 1]))
        .collect();
    in_out_pairs.insert(0, (config.in_dim, config.units[0]));

    let hidden = in_out_pairs
        .iter()
        .enumerate()
        .map(|(i, &(in_dim, out_dim))| Ok(linear(in_dim, out_dim, vb.pp(format!("ln{}", i)))?))
        .collect::<Result<Vec<_>>>()?;

    let vb = vb.pp(format!("ln{}", in_out_pairs.len()));
    let last = match config.init_w {
        Some(init_w) => uniform_linear(last_unit, config.out_dim, init_w, vb)?,
        None => linear(last_unit, config.out_dim, vb)?,
    };

    Ok((hidden, last))
}

/// Multilayer perceptron.
///
/// Inputs can have arbitrary leading dimensions, the last one being the feature.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    hidden: Vec<Linear>,
    last: Linear,
}

impl Mlp {
    /// Outputs of the last hidden layer.
    pub fn forward_hidden(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.to_device(&self.device)?;
        for layer in self.hidden.iter() {
            xs = self.config.activation.forward(&layer.forward(&xs)?)?;
        }
        Ok(xs)
    }

    /// Outputs of the last hidden layer and of the network.
    pub fn forward_with_hidden(&self, xs: &Tensor) -> Result<(Tensor, Tensor)> {
        let hidden = self.forward_hidden(xs)?;
        let out = self.last.forward(&hidden)?;
        Ok((hidden, out))
    }

    /// Concatenates inputs along the last dimension, then applies the network.
    pub fn forward_flat(&self, xs: &[&Tensor]) -> Result<Tensor> {
        let xs = Tensor::cat(xs, D::Minus1)?;
        self.forward(&xs)
    }

    /// Configuration of the network.
    pub fn config(&self) -> &MlpConfig {
        &self.config
    }
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let xs = self.forward_hidden(xs)?;
        Ok(self.last.forward(&xs)?)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let (hidden, last) = create_layers(vb.pp("mlp"), &config)?;

        Ok(Self {
            config,
            device,
            hidden,
            last,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Activation;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_mlp_shapes() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = MlpConfig::new(5, vec![16, 16, 16], 3).activation(Activation::Tanh);
        let mlp = Mlp::build(vb, config)?;

        let xs = Tensor::zeros((4, 7, 5), DType::F32, &Device::Cpu)?;
        assert_eq!(mlp.forward(&xs)?.dims(), [4, 7, 3]);

        let x1 = Tensor::zeros((8, 2), DType::F32, &Device::Cpu)?;
        let x2 = Tensor::zeros((8, 3), DType::F32, &Device::Cpu)?;
        assert_eq!(mlp.forward_flat(&[&x1, &x2])?.dims(), [8, 3]);

        // Three hidden layers and the output layer, each with a weight and a bias.
        assert_eq!(varmap.all_vars().len(), 8);
        Ok(())
    }

    #[test]
    fn test_mlp_output_layer_init() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = MlpConfig::new(4, vec![8, 8], 2).init_w(3e-3);
        let _mlp = Mlp::build(vb, config)?;

        let data = varmap.data().lock().unwrap();
        let w = data.get("mlp.ln2.weight").unwrap().as_tensor();
        let max = w.abs()?.max_all()?.to_scalar::<f32>()?;
        assert!(max <= 3e-3);
        Ok(())
    }
}
