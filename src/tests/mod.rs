pub mod test_network;
pub mod test_update_rule;

use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::activations::Activation;
use crate::layers::{DenseLayer, WeightInit};
use crate::network::{Device, QNetwork};
use crate::replay_buffer::Experience;

/// One linear layer with the given weights and biases.
pub(crate) fn linear_network(weights: Array2<f32>, biases: Array1<f32>) -> QNetwork {
    let (inputs, outputs) = weights.dim();
    let layer = DenseLayer::new_using(inputs, outputs, Activation::Linear, WeightInit::Zeros, &mut StdRng::seed_from_u64(0))
        .with_weights(weights)
        .unwrap()
        .with_biases(biases)
        .unwrap();
    QNetwork::from_layers(vec![layer], Device::Cpu).unwrap()
}

/// Network over a single input whose action-values are just `biases`.
pub(crate) fn bias_network(biases: Array1<f32>) -> QNetwork {
    let actions = biases.len();
    linear_network(Array2::zeros((1, actions)), biases)
}

pub(crate) fn experience(state: &[f32], action: usize, reward: f32, next_state: &[f32], done: bool) -> Experience {
    Experience {
        state: Array1::from_vec(state.to_vec()),
        action,
        reward,
        next_state: Array1::from_vec(next_state.to_vec()),
        done,
    }
}
