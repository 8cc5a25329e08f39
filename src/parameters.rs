//! Plain parameter snapshots exchanged between networks, optimizers and checkpoints.

use ndarray::{Array1, Array2};
use serde::{Serialize, Deserialize};

use crate::error::{DdqnError, Result};

/// Weights and biases of one dense layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerParameters {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// Every learnable parameter of a network, in layer order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub layers: Vec<LayerParameters>,
}

/// Gradients of the loss with respect to one layer's parameters.
#[derive(Clone, Debug)]
pub struct LayerGradients {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

impl Parameters {
    /// Shapes as `((inputs, outputs), biases)` per layer.
    pub fn shapes(&self) -> Vec<((usize, usize), usize)> {
        self.layers
            .iter()
            .map(|layer| (layer.weights.dim(), layer.biases.len()))
            .collect()
    }

    /// Total number of scalar parameters.
    pub fn len(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weights.len() + layer.biases.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails with `ShapeMismatch` unless `other` has exactly the same layer shapes.
    pub fn ensure_compatible(&self, other: &Parameters) -> Result<()> {
        let ours = self.shapes();
        let theirs = other.shapes();
        if ours != theirs {
            return Err(DdqnError::shape_mismatch(format!("{:?}", ours), format!("{:?}", theirs)));
        }
        Ok(())
    }

    /// Bit-for-bit equality. Unlike `==`, NaN compares equal to an identical NaN.
    pub fn bit_eq(&self, other: &Parameters) -> bool {
        if self.shapes() != other.shapes() {
            return false;
        }
        self.layers.iter().zip(&other.layers).all(|(a, b)| {
            a.weights.iter().zip(b.weights.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
                && a.biases.iter().zip(b.biases.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn single(weights: Array2<f32>, biases: Array1<f32>) -> Parameters {
        Parameters { layers: vec![LayerParameters { weights, biases }] }
    }

    #[test]
    fn test_compatibility_checks_shapes_only() {
        let a = single(array![[1.0, 2.0]], array![0.0, 0.0]);
        let b = single(array![[3.0, 4.0]], array![1.0, 1.0]);
        let c = single(array![[1.0], [2.0]], array![0.0]);

        assert!(a.ensure_compatible(&b).is_ok());
        assert!(matches!(a.ensure_compatible(&c), Err(DdqnError::ShapeMismatch { .. })));
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn test_bit_eq_treats_identical_nan_as_equal() {
        let a = single(array![[f32::NAN, 1.0]], array![0.0, 0.0]);
        let b = a.clone();
        assert_ne!(a, b);
        assert!(a.bit_eq(&b));
    }
}
