use ndarray::{Array1, ArrayView1};

use crate::error::{DdqnError, Result};

/// Trait defining the interface for loss functions
pub trait Loss: Send + Sync {
    /// Loss averaged over the batch
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Result<f32>;

    /// Gradient of the loss with respect to each prediction; targets are constants
    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Result<Array1<f32>>;
}

/// Mean squared error: `mean((target - prediction)^2)`
#[derive(Clone, Copy, Debug, Default)]
pub struct MSE;

fn check_lengths(predictions: &ArrayView1<f32>, targets: &ArrayView1<f32>) -> Result<()> {
    if predictions.len() != targets.len() {
        return Err(DdqnError::shape_mismatch(
            format!("{} targets", predictions.len()),
            format!("{} targets", targets.len()),
        ));
    }
    if predictions.is_empty() {
        return Err(DdqnError::shape_mismatch("non-empty batch", "empty batch"));
    }
    Ok(())
}

impl Loss for MSE {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Result<f32> {
        check_lengths(&predictions, &targets)?;
        let diff = &predictions - &targets;
        Ok(diff.mapv(|x| x * x).sum() / predictions.len() as f32)
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Result<Array1<f32>> {
        check_lengths(&predictions, &targets)?;
        let scale = 2.0 / predictions.len() as f32;
        Ok((&predictions - &targets) * scale)
    }
}
