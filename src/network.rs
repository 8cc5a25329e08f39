use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::path::Path;

use crate::activations::Activation;
use crate::error::{DdqnError, Result};
use crate::layers::{DenseLayer, WeightInit};
use crate::optimizer::{Optimizer, OptimizerWrapper};
use crate::parameters::{LayerGradients, Parameters};
use crate::storage;

/// Where a network does its arithmetic.
///
/// Passed explicitly through [`NetworkConfig`]; nothing in the crate pins a
/// process-wide device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Device {
    /// Single-threaded ndarray kernels
    #[default]
    Cpu,
    /// Element-wise work spread over the rayon thread pool
    Parallel,
}

/// Architecture of a Q-network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Input width, hidden widths, then the number of actions
    pub layer_sizes: Vec<usize>,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    pub weight_init: WeightInit,
    /// Dropout on hidden layers while training
    pub dropout: f32,
    pub device: Device,
}

impl NetworkConfig {
    /// Two hidden layers of 64 ReLU units and a linear output.
    pub fn new(state_size: usize, action_size: usize) -> Self {
        NetworkConfig {
            layer_sizes: vec![state_size, 64, 64, action_size],
            hidden_activation: Activation::Relu,
            output_activation: Activation::Linear,
            weight_init: WeightInit::default(),
            dropout: 0.0,
            device: Device::Cpu,
        }
    }

    pub fn with_hidden_layers(mut self, hidden: &[usize]) -> Self {
        let input = self.input_size();
        let output = self.num_actions();
        self.layer_sizes = std::iter::once(input)
            .chain(hidden.iter().copied())
            .chain(std::iter::once(output))
            .collect();
        self
    }

    pub fn input_size(&self) -> usize {
        self.layer_sizes.first().copied().unwrap_or(0)
    }

    pub fn num_actions(&self) -> usize {
        self.layer_sizes.last().copied().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.layer_sizes.len() < 2 {
            return Err(DdqnError::invalid_parameter(
                "layer_sizes",
                "must contain at least input and output sizes",
            ));
        }
        if self.layer_sizes.iter().any(|&size| size == 0) {
            return Err(DdqnError::invalid_parameter("layer_sizes", "every layer must be non-empty"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(DdqnError::invalid_parameter("dropout", "rate must be in [0, 1)"));
        }
        if let WeightInit::Uniform { min, max } = self.weight_init {
            if !(min <= max) {
                return Err(DdqnError::invalid_parameter("weight_init", "min must not exceed max"));
            }
        }
        Ok(())
    }
}

/// What the learning core needs from a value function approximator.
///
/// `predict` is the detached path: nothing is recorded and training-only
/// behaviour such as dropout is skipped. `forward` records what `backward`
/// needs, unless the approximator is in inference mode.
pub trait FunctionApproximator {
    fn input_size(&self) -> usize;

    fn num_actions(&self) -> usize;

    /// `[B, input_size]` states to `[B, num_actions]` action-values, without gradient tracking.
    fn predict(&self, states: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Same shape contract as `predict`, recording activations for `backward`.
    fn forward(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Gradients of the loss given `d loss / d output` for the last `forward` call.
    fn backward(&self, output_gradient: ArrayView2<f32>) -> Result<Vec<LayerGradients>>;

    fn parameters(&self) -> Parameters;

    fn load_parameters(&mut self, parameters: &Parameters) -> Result<()>;

    /// Overwrite every parameter with `source`'s.
    ///
    /// Panics if the two are not structurally identical; check with
    /// [`FunctionApproximator::is_compatible_with`] first.
    fn copy_parameters_from(&mut self, source: &Self)
    where
        Self: Sized;

    fn is_compatible_with(&self, other: &Self) -> bool
    where
        Self: Sized;

    fn set_inference_mode(&mut self, inference: bool);

    fn is_inference_mode(&self) -> bool;
}

/// A feed-forward network mapping states to one value per action.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QNetwork {
    pub layers: Vec<DenseLayer>,
    pub device: Device,
    #[serde(skip)]
    inference: bool,
}

impl QNetwork {
    /// Build a freshly initialised network.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        Self::new_using(config, &mut rand::thread_rng())
    }

    /// Build a freshly initialised network, drawing weights from `rng`.
    pub fn new_using<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let last = config.layer_sizes.len() - 2;
        let mut layers = Vec::with_capacity(config.layer_sizes.len() - 1);
        for (i, window) in config.layer_sizes.windows(2).enumerate() {
            let activation = if i == last { config.output_activation } else { config.hidden_activation };
            let mut layer = DenseLayer::new_using(window[0], window[1], activation, config.weight_init, rng);
            if i != last {
                layer = layer.with_dropout(config.dropout)?;
            }
            layers.push(layer);
        }

        Ok(QNetwork { layers, device: config.device, inference: false })
    }

    /// Assemble a network from explicit layers, checking that they chain.
    pub fn from_layers(layers: Vec<DenseLayer>, device: Device) -> Result<Self> {
        if layers.is_empty() {
            return Err(DdqnError::invalid_parameter("layers", "network needs at least one layer"));
        }
        for pair in layers.windows(2) {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(DdqnError::shape_mismatch(
                    pair[0].output_size().to_string(),
                    pair[1].input_size().to_string(),
                ));
            }
        }
        Ok(QNetwork { layers, device, inference: false })
    }

    fn parallel(&self) -> bool {
        self.device == Device::Parallel
    }

    fn check_input(&self, states: &ArrayView2<f32>) -> Result<()> {
        if states.ncols() != self.input_size() {
            return Err(DdqnError::shape_mismatch(
                format!("[B, {}]", self.input_size()),
                format!("{:?}", states.dim()),
            ));
        }
        Ok(())
    }

    /// Action-values for a single state.
    pub fn q_values(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        let batch = self.predict(state.insert_axis(Axis(0)))?;
        Ok(batch.index_axis(Axis(0), 0).to_owned())
    }

    /// One optimizer step over every layer.
    pub fn apply_gradients(
        &mut self,
        optimizer: &mut OptimizerWrapper,
        gradients: &[LayerGradients],
        learning_rate: f32,
    ) -> Result<()> {
        if gradients.len() != self.layers.len() {
            return Err(DdqnError::shape_mismatch(
                format!("{} layer gradients", self.layers.len()),
                format!("{} layer gradients", gradients.len()),
            ));
        }
        for (index, (layer, grads)) in self.layers.iter_mut().zip(gradients).enumerate() {
            optimizer.update(index, &mut layer.weights, &mut layer.biases, grads, learning_rate)?;
        }
        optimizer.end_step();
        Ok(())
    }

    /// Save the network to a file (bincode).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        storage::write_atomically(path.as_ref(), &serialized)
    }

    /// Load a network from a file written by [`QNetwork::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        let network: Self = bincode::deserialize(&data)?;
        Ok(network)
    }
}

impl FunctionApproximator for QNetwork {
    fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.input_size())
    }

    fn num_actions(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.output_size())
    }

    fn predict(&self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(&states)?;
        let parallel = self.parallel();
        let mut current = states.to_owned();
        for layer in &self.layers {
            current = layer.predict(current.view(), parallel);
        }
        Ok(current)
    }

    fn forward(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        if self.inference {
            return self.predict(states);
        }
        self.check_input(&states)?;
        let parallel = self.parallel();
        let mut rng = rand::thread_rng();
        let mut current = states.to_owned();
        for layer in &mut self.layers {
            current = layer.forward(current.view(), parallel, &mut rng);
        }
        Ok(current)
    }

    fn backward(&self, output_gradient: ArrayView2<f32>) -> Result<Vec<LayerGradients>> {
        if self.inference {
            return Err(DdqnError::TrainingError(
                "network is in inference mode; no gradients are tracked".to_string(),
            ));
        }
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_gradient.to_owned();
        for layer in self.layers.iter().rev() {
            let (input_error, grads) = layer.backward(current_error.view())?;
            gradients.push(grads);
            current_error = input_error;
        }
        gradients.reverse();
        Ok(gradients)
    }

    fn parameters(&self) -> Parameters {
        Parameters {
            layers: self.layers.iter().map(|layer| layer.parameters()).collect(),
        }
    }

    fn load_parameters(&mut self, parameters: &Parameters) -> Result<()> {
        self.parameters().ensure_compatible(parameters)?;
        for (layer, params) in self.layers.iter_mut().zip(&parameters.layers) {
            layer.assign(params.weights.view(), params.biases.view());
            layer.clear_cache();
        }
        Ok(())
    }

    fn copy_parameters_from(&mut self, source: &Self) {
        assert!(self.is_compatible_with(source), "networks are not structurally identical");
        for (layer, src) in self.layers.iter_mut().zip(&source.layers) {
            layer.assign(src.weights.view(), src.biases.view());
        }
    }

    fn is_compatible_with(&self, other: &Self) -> bool {
        self.layers.len() == other.layers.len()
            && self.layers.iter().zip(&other.layers).all(|(a, b)| {
                a.weights.dim() == b.weights.dim()
                    && a.biases.len() == b.biases.len()
                    && a.activation == b.activation
            })
    }

    fn set_inference_mode(&mut self, inference: bool) {
        self.inference = inference;
        if inference {
            for layer in &mut self.layers {
                layer.clear_cache();
            }
        }
    }

    fn is_inference_mode(&self) -> bool {
        self.inference
    }
}
