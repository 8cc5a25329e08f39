//! # Activation Functions
//!
//! Element-wise non-linearities applied after each dense layer of a Q-network.
//!
//! - **ReLU**: `max(0, x)`, the default for hidden layers
//! - **Linear**: identity, the default for the output layer (action-values are unbounded)
//! - **Sigmoid**, **Tanh**, **LeakyReLU**: alternatives for hidden layers
//!
//! ```rust
//! use ddqn::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5], [0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut data);
//! assert_eq!(data, array![[1.0, 0.0], [0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
