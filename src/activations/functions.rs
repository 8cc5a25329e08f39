use ndarray::{Array2, ArrayView2};
use serde::{Serialize, Deserialize};

/// An enumeration of the activation functions a Q-network layer can use.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum Activation {
    #[default]
    Relu,
    Linear,
    Sigmoid,
    Tanh,
    LeakyRelu { alpha: f32 },
}

impl Activation {
    /// Value of the activation at `v`.
    #[inline]
    pub fn value(&self, v: f32) -> f32 {
        match *self {
            Activation::Relu => v.max(0.0),
            Activation::Linear => v,
            Activation::Sigmoid => 1.0 / (1.0 + (-v).exp()),
            Activation::Tanh => v.tanh(),
            Activation::LeakyRelu { alpha } => if v > 0.0 { v } else { alpha * v },
        }
    }

    /// Derivative of the activation at the pre-activation value `v`.
    #[inline]
    pub fn slope(&self, v: f32) -> f32 {
        match *self {
            Activation::Relu => if v > 0.0 { 1.0 } else { 0.0 },
            Activation::Linear => 1.0,
            Activation::Sigmoid => {
                let sigmoid = 1.0 / (1.0 + (-v).exp());
                sigmoid * (1.0 - sigmoid)
            }
            Activation::Tanh => {
                let tanh_v = v.tanh();
                1.0 - tanh_v * tanh_v
            }
            Activation::LeakyRelu { alpha } => if v > 0.0 { 1.0 } else { alpha },
        }
    }

    /// Apply the activation function to a batch in-place.
    pub fn apply_batch(&self, inputs: &mut Array2<f32>) {
        if *self == Activation::Linear {
            return;
        }
        let activation = *self;
        inputs.mapv_inplace(|v| activation.value(v));
    }

    /// Same as [`Activation::apply_batch`], spread across the rayon pool.
    pub fn par_apply_batch(&self, inputs: &mut Array2<f32>) {
        if *self == Activation::Linear {
            return;
        }
        let activation = *self;
        inputs.par_mapv_inplace(move |v| activation.value(v));
    }

    /// Compute the derivative of the activation function for a batch of pre-activations.
    pub fn derivative_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Activation::Linear => Array2::ones(inputs.dim()),
            _ => {
                let activation = *self;
                inputs.mapv(|v| activation.slope(v))
            }
        }
    }
}
