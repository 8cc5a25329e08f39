use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{DdqnError, Result};
use crate::parameters::{LayerGradients, LayerParameters};
use super::dropout::Dropout;
use super::initialization::WeightInit;

/// A fully connected (dense) layer of a Q-network
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    dropout: Option<Dropout>,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer with `WeightInit::LecunUniform` weights and zero biases.
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> Self {
        Self::new_using(input_size, output_size, activation, WeightInit::default(), &mut rand::thread_rng())
    }

    /// Create a new dense layer drawing its weights from `rng`.
    pub fn new_using<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Self {
        DenseLayer {
            weights: init.initialize_weights((input_size, output_size), rng),
            biases: Array1::zeros(output_size),
            activation,
            dropout: None,
            pre_activation_output: None,
            inputs: None,
        }
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Result<Self> {
        if weights.dim() != self.weights.dim() {
            return Err(DdqnError::shape_mismatch(
                format!("{:?}", self.weights.dim()),
                format!("{:?}", weights.dim()),
            ));
        }
        self.weights = weights;
        Ok(self)
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Result<Self> {
        if biases.len() != self.biases.len() {
            return Err(DdqnError::shape_mismatch(
                self.biases.len().to_string(),
                biases.len().to_string(),
            ));
        }
        self.biases = biases;
        Ok(self)
    }

    /// Drop activations with probability `rate` while training.
    pub fn with_dropout(mut self, rate: f32) -> Result<Self> {
        self.dropout = if rate > 0.0 { Some(Dropout::new(rate)?) } else { None };
        Ok(self)
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    pub fn dropout_rate(&self) -> f32 {
        self.dropout.as_ref().map_or(0.0, |d| d.rate)
    }

    fn affine(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0))
    }

    /// Forward pass without recording anything for backpropagation.
    pub fn predict(&self, inputs: ArrayView2<f32>, parallel: bool) -> Array2<f32> {
        let mut outputs = self.affine(inputs);
        if parallel {
            self.activation.par_apply_batch(&mut outputs);
        } else {
            self.activation.apply_batch(&mut outputs);
        }
        outputs
    }

    /// Forward pass that caches inputs and pre-activations for [`DenseLayer::backward`].
    pub fn forward<R: Rng + ?Sized>(&mut self, inputs: ArrayView2<f32>, parallel: bool, rng: &mut R) -> Array2<f32> {
        let pre_activation = self.affine(inputs);
        let mut outputs = pre_activation.clone();
        if parallel {
            self.activation.par_apply_batch(&mut outputs);
        } else {
            self.activation.apply_batch(&mut outputs);
        }
        if let Some(dropout) = self.dropout.as_mut() {
            dropout.apply(&mut outputs, rng);
        }
        self.inputs = Some(inputs.to_owned());
        self.pre_activation_output = Some(pre_activation);
        outputs
    }

    /// Returns the error to pass to the previous layer and this layer's gradients.
    pub fn backward(&self, output_errors: ArrayView2<f32>) -> Result<(Array2<f32>, LayerGradients)> {
        let (pre_activation, inputs) = match (&self.pre_activation_output, &self.inputs) {
            (Some(pre), Some(inputs)) => (pre, inputs),
            _ => {
                return Err(DdqnError::TrainingError(
                    "forward() must be called before backward()".to_string(),
                ))
            }
        };
        if output_errors.dim() != pre_activation.dim() {
            return Err(DdqnError::shape_mismatch(
                format!("{:?}", pre_activation.dim()),
                format!("{:?}", output_errors.dim()),
            ));
        }

        let errors = match &self.dropout {
            Some(dropout) => dropout.backward(output_errors),
            None => output_errors.to_owned(),
        };
        let adjusted_error = errors * &self.activation.derivative_batch(pre_activation.view());
        let gradients = LayerGradients {
            weights: inputs.t().dot(&adjusted_error),
            biases: adjusted_error.sum_axis(Axis(0)),
        };
        let input_error = adjusted_error.dot(&self.weights.t());
        Ok((input_error, gradients))
    }

    /// Forget cached activations so no stale graph survives a mode switch.
    pub fn clear_cache(&mut self) {
        self.inputs = None;
        self.pre_activation_output = None;
        if let Some(dropout) = self.dropout.as_mut() {
            dropout.clear();
        }
    }

    pub fn parameters(&self) -> LayerParameters {
        LayerParameters {
            weights: self.weights.clone(),
            biases: self.biases.clone(),
        }
    }

    /// Overwrite weights and biases in place. Shapes are the caller's responsibility.
    pub(crate) fn assign(&mut self, weights: ArrayView2<f32>, biases: ArrayView1<f32>) {
        self.weights.assign(&weights);
        self.biases.assign(&biases);
    }
}
