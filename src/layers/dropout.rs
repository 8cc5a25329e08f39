use ndarray::{Array2, ArrayView2};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{DdqnError, Result};

/// Inverted dropout applied to a layer's activations.
///
/// Randomly zeroes units with probability `rate` during training and scales the
/// survivors by `1 / (1 - rate)`, so inference needs no rescaling. Networks in
/// inference mode never call [`Dropout::apply`].
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Dropout {
    /// Dropout probability (probability of dropping a unit)
    pub rate: f32,

    /// Cached mask for the backward pass
    #[serde(skip)]
    mask: Option<Array2<f32>>,
}

impl Dropout {
    pub fn new(rate: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&rate) {
            return Err(DdqnError::invalid_parameter("dropout", "rate must be in [0, 1)"));
        }
        Ok(Dropout { rate, mask: None })
    }

    /// Zero out units in-place and remember which ones survived.
    pub fn apply<R: Rng + ?Sized>(&mut self, outputs: &mut Array2<f32>, rng: &mut R) {
        if self.rate == 0.0 {
            self.mask = None;
            return;
        }

        let scale = 1.0 / (1.0 - self.rate);
        let rate = self.rate;
        let mask = Array2::from_shape_fn(outputs.dim(), |_| {
            if rng.gen::<f32>() >= rate { scale } else { 0.0 }
        });
        *outputs *= &mask;
        self.mask = Some(mask);
    }

    /// Route the error only through the units that survived the last `apply`.
    pub fn backward(&self, output_errors: ArrayView2<f32>) -> Array2<f32> {
        match &self.mask {
            Some(mask) => &output_errors * mask,
            None => output_errors.to_owned(),
        }
    }

    pub fn clear(&mut self) {
        self.mask = None;
    }
}
