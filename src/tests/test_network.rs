use ndarray::{array, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::activations::Activation;
use crate::error::DdqnError;
use crate::network::{Device, FunctionApproximator, NetworkConfig, QNetwork};
use super::linear_network;

fn small_config() -> NetworkConfig {
    let mut config = NetworkConfig::new(3, 2).with_hidden_layers(&[4]);
    config.hidden_activation = Activation::Tanh;
    config
}

fn seeded(config: &NetworkConfig, seed: u64) -> QNetwork {
    QNetwork::new_using(config, &mut StdRng::seed_from_u64(seed)).unwrap()
}

#[test]
fn test_network_creation() {
    let network = QNetwork::new(&NetworkConfig::new(4, 2)).unwrap();
    assert_eq!(network.layers.len(), 3);
    assert_eq!(network.input_size(), 4);
    assert_eq!(network.num_actions(), 2);
    assert_eq!(network.layers[2].activation, Activation::Linear);
    assert_eq!(network.layers[0].activation, Activation::Relu);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = NetworkConfig::new(4, 2);
    config.layer_sizes = vec![4];
    assert!(matches!(QNetwork::new(&config), Err(DdqnError::InvalidParameter { .. })));

    let mut config = NetworkConfig::new(4, 2);
    config.dropout = 1.0;
    assert!(QNetwork::new(&config).is_err());
}

#[test]
fn test_from_layers_checks_chaining() {
    use crate::layers::DenseLayer;
    let layers = vec![
        DenseLayer::new(3, 4, Activation::Relu),
        DenseLayer::new(5, 2, Activation::Linear),
    ];
    assert!(matches!(QNetwork::from_layers(layers, Device::Cpu), Err(DdqnError::ShapeMismatch { .. })));
}

#[test]
fn test_predict_shapes() {
    let network = seeded(&small_config(), 1);
    let output = network.predict(Array2::<f32>::zeros((5, 3)).view()).unwrap();
    assert_eq!(output.shape(), [5, 2]);

    let err = network.predict(Array2::<f32>::zeros((5, 4)).view()).unwrap_err();
    assert!(matches!(err, DdqnError::ShapeMismatch { .. }));
}

#[test]
fn test_q_values_single_state() {
    let network = linear_network(array![[1.0, 0.0], [0.0, 2.0]], array![0.5, 0.0]);
    let q = network.q_values(array![1.0, 1.0].view()).unwrap();
    assert_eq!(q, array![1.5, 2.0]);
}

#[test]
fn test_predict_equals_forward_without_dropout() {
    let mut network = seeded(&small_config(), 2);
    let states = array![[0.1, -0.4, 0.9], [1.0, 0.0, -1.0]];
    let detached = network.predict(states.view()).unwrap();
    let tracked = network.forward(states.view()).unwrap();
    assert_eq!(detached, tracked);
}

#[test]
fn test_backward_matches_finite_differences() {
    let mut network = seeded(&small_config(), 3);
    let states = array![[0.3, -0.2, 0.5], [-0.7, 0.1, 0.4]];
    let upstream = array![[1.0, -0.5], [0.25, 2.0]];

    network.forward(states.view()).unwrap();
    let gradients = network.backward(upstream.view()).unwrap();
    assert_eq!(gradients.len(), 2);

    let objective = |net: &QNetwork| (net.predict(states.view()).unwrap() * &upstream).sum();
    let eps = 1e-2;
    for layer in 0..2 {
        let (rows, cols) = network.layers[layer].weights.dim();
        for i in 0..rows {
            for j in 0..cols {
                let mut plus = network.clone();
                plus.layers[layer].weights[[i, j]] += eps;
                let mut minus = network.clone();
                minus.layers[layer].weights[[i, j]] -= eps;
                let numeric = (objective(&plus) - objective(&minus)) / (2.0 * eps);
                let analytic = gradients[layer].weights[[i, j]];
                assert!(
                    (numeric - analytic).abs() < 5e-3,
                    "layer {} weight ({}, {}): numeric {} analytic {}",
                    layer, i, j, numeric, analytic
                );
            }
        }
    }
}

#[test]
fn test_inference_mode_disables_backward() {
    let mut network = seeded(&small_config(), 4);
    network.set_inference_mode(true);
    assert!(network.is_inference_mode());

    let states = array![[0.1, 0.2, 0.3]];
    let output = network.forward(states.view()).unwrap();
    assert_eq!(output, network.predict(states.view()).unwrap());

    let err = network.backward(Array2::<f32>::ones((1, 2)).view()).unwrap_err();
    assert!(matches!(err, DdqnError::TrainingError(_)));
}

#[test]
fn test_copy_parameters_from() {
    let source = seeded(&small_config(), 5);
    let mut dest = seeded(&small_config(), 6);
    assert!(!dest.parameters().bit_eq(&source.parameters()));

    dest.copy_parameters_from(&source);
    assert!(dest.parameters().bit_eq(&source.parameters()));
    assert_eq!(dest.parameters(), source.parameters());
}

#[test]
fn test_compatibility() {
    let a = seeded(&small_config(), 7);
    let b = seeded(&small_config(), 8);
    assert!(a.is_compatible_with(&b));

    let wider = seeded(&NetworkConfig::new(3, 2).with_hidden_layers(&[5]), 9);
    assert!(!a.is_compatible_with(&wider));

    // Same shapes, different hidden activation
    let relu = seeded(&NetworkConfig::new(3, 2).with_hidden_layers(&[4]), 10);
    assert!(!a.is_compatible_with(&relu));
}

#[test]
fn test_load_parameters_rejects_other_layout() {
    let mut network = seeded(&small_config(), 11);
    let before = network.parameters();
    let wider = seeded(&NetworkConfig::new(3, 2).with_hidden_layers(&[5]), 12);

    let err = network.load_parameters(&wider.parameters()).unwrap_err();
    assert!(matches!(err, DdqnError::ShapeMismatch { .. }));
    assert!(network.parameters().bit_eq(&before));
}

#[test]
fn test_parallel_device_matches_cpu() {
    let cpu = seeded(&small_config(), 13);
    let mut parallel = cpu.clone();
    parallel.device = Device::Parallel;

    let states = array![[0.5, -1.0, 0.25], [2.0, 0.3, -0.6], [0.0, 0.0, 0.0]];
    assert_eq!(cpu.predict(states.view()).unwrap(), parallel.predict(states.view()).unwrap());
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("network.bin");
    let network = seeded(&small_config(), 14);

    network.save(&path).unwrap();
    let loaded = QNetwork::load(&path).unwrap();
    assert!(loaded.parameters().bit_eq(&network.parameters()));
    assert!(!loaded.is_inference_mode());

    assert!(QNetwork::load(dir.path().join("missing.bin")).unwrap_err().is_persistence());
}
