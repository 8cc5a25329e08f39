//! Bootstrapped targets and the batch loss.
//!
//! An [`UpdateRule`] decides how the value of the next state is estimated.
//! [`DoubleQ`] selects the next action with the online network and evaluates
//! it with the target network; [`VanillaQ`] lets the target network do both.
//! Everything else about the learning step is shared and lives in
//! [`evaluate_batch`].

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::batch::TransitionBatch;
use crate::error::{DdqnError, Result};
use crate::loss::{Loss, MSE};
use crate::network::FunctionApproximator;

/// Strategy for estimating `V(s')` in the bootstrapped target.
pub trait UpdateRule {
    fn name(&self) -> &'static str;

    /// One value per row of `next_states`. Neither network records gradients here.
    fn bootstrap_values<F: FunctionApproximator>(
        &self,
        online: &F,
        target: &F,
        next_states: ArrayView2<f32>,
    ) -> Result<Array1<f32>>;
}

/// Double DQN: online network picks `argmax_a Q(s', a)`, target network scores it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DoubleQ;

impl UpdateRule for DoubleQ {
    fn name(&self) -> &'static str {
        "double_dqn"
    }

    fn bootstrap_values<F: FunctionApproximator>(
        &self,
        online: &F,
        target: &F,
        next_states: ArrayView2<f32>,
    ) -> Result<Array1<f32>> {
        let selection_values = online.predict(next_states)?;
        let selected = argmax_rows(selection_values.view());
        let evaluation_values = target.predict(next_states)?;
        gather(evaluation_values.view(), selected.view())
    }
}

/// Vanilla DQN: the target network's own maximum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VanillaQ;

impl UpdateRule for VanillaQ {
    fn name(&self) -> &'static str {
        "dqn"
    }

    fn bootstrap_values<F: FunctionApproximator>(
        &self,
        _online: &F,
        target: &F,
        next_states: ArrayView2<f32>,
    ) -> Result<Array1<f32>> {
        let values = target.predict(next_states)?;
        let best = argmax_rows(values.view());
        gather(values.view(), best.view())
    }
}

/// Index of the largest value in each row. Ties go to the lowest index and NaN never wins.
pub fn argmax_rows(values: ArrayView2<f32>) -> Array1<usize> {
    values
        .axis_iter(Axis(0))
        .map(|row| {
            let mut best = 0;
            let mut best_value = f32::NEG_INFINITY;
            for (i, &v) in row.iter().enumerate() {
                if v > best_value {
                    best = i;
                    best_value = v;
                }
            }
            best
        })
        .collect()
}

/// `values[i, indices[i]]` for every row.
pub fn gather(values: ArrayView2<f32>, indices: ArrayView1<usize>) -> Result<Array1<f32>> {
    if values.nrows() != indices.len() {
        return Err(DdqnError::shape_mismatch(
            format!("{} indices", values.nrows()),
            format!("{} indices", indices.len()),
        ));
    }
    let columns = values.ncols();
    indices
        .iter()
        .enumerate()
        .map(|(row, &col)| {
            if col >= columns {
                return Err(DdqnError::InvalidAction { action: col, max_actions: columns });
            }
            Ok(values[[row, col]])
        })
        .collect()
}

/// `reward + gamma * next_value * (1 - done)`.
///
/// When `1 - done` is exactly zero the target is the reward alone, even if
/// `next_value` is not finite.
pub fn td_targets(
    rewards: ArrayView1<f32>,
    dones: ArrayView1<f32>,
    next_values: ArrayView1<f32>,
    gamma: f32,
) -> Result<Array1<f32>> {
    let batch_size = rewards.len();
    if dones.len() != batch_size || next_values.len() != batch_size {
        return Err(DdqnError::shape_mismatch(
            format!("{} rewards, dones and next values", batch_size),
            format!("{} / {} / {}", batch_size, dones.len(), next_values.len()),
        ));
    }
    Ok(ndarray::Zip::from(&rewards)
        .and(&dones)
        .and(&next_values)
        .map_collect(|&reward, &done, &next_value| {
            let continuation = 1.0 - done;
            if continuation == 0.0 {
                reward
            } else {
                reward + gamma * next_value * continuation
            }
        }))
}

/// Loss of one batch and what backpropagation needs from it.
#[derive(Clone, Debug)]
pub struct BatchEvaluation {
    pub loss: f32,
    /// Online `Q(s, a)` for the stored actions
    pub predictions: Array1<f32>,
    /// Bootstrapped targets, treated as constants
    pub targets: Array1<f32>,
    /// `d loss / d Q(s, .)`, non-zero only at the stored actions
    pub output_gradient: Array2<f32>,
}

/// Compute targets with `rule`, run the tracked online forward pass and the MSE loss.
///
/// The online network's recorded activations are the only side effect.
pub fn evaluate_batch<R: UpdateRule, F: FunctionApproximator>(
    rule: &R,
    online: &mut F,
    target: &F,
    batch: &TransitionBatch,
    gamma: f32,
) -> Result<BatchEvaluation> {
    batch.validate(online.input_size(), online.num_actions())?;

    let next_values = rule.bootstrap_values(&*online, target, batch.next_states.view())?;
    let targets = td_targets(batch.rewards.view(), batch.dones.view(), next_values.view(), gamma)?;

    let q_values = online.forward(batch.states.view())?;
    let predictions = gather(q_values.view(), batch.actions.view())?;

    let loss = MSE.compute(predictions.view(), targets.view())?;
    let per_sample = MSE.gradient(predictions.view(), targets.view())?;

    let mut output_gradient = Array2::zeros(q_values.dim());
    for (row, (&action, &grad)) in batch.actions.iter().zip(per_sample.iter()).enumerate() {
        output_gradient[[row, action]] = grad;
    }

    Ok(BatchEvaluation { loss, predictions, targets, output_gradient })
}
