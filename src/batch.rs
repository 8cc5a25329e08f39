//! Column-oriented batches of transitions fed to the update rule.

use ndarray::{Array1, Array2};

use crate::error::{DdqnError, Result};
use crate::replay_buffer::Experience;

/// `B` transitions stacked column-wise.
///
/// `dones` holds 1.0 for terminal transitions and 0.0 otherwise so it can be
/// used directly in the bootstrapped target arithmetic.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionBatch {
    pub states: Array2<f32>,
    pub actions: Array1<usize>,
    pub rewards: Array1<f32>,
    pub next_states: Array2<f32>,
    pub dones: Array1<f32>,
}

impl TransitionBatch {
    /// Stack experiences into a batch, rejecting ragged state vectors.
    pub fn from_experiences(experiences: &[&Experience]) -> Result<Self> {
        let first = experiences
            .first()
            .ok_or_else(|| DdqnError::shape_mismatch("at least one transition", "none"))?;
        let batch_size = experiences.len();
        let state_size = first.state.len();

        let mut states = Array2::zeros((batch_size, state_size));
        let mut next_states = Array2::zeros((batch_size, state_size));
        let mut actions = Array1::zeros(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut dones = Array1::zeros(batch_size);

        for (i, exp) in experiences.iter().enumerate() {
            if exp.state.len() != state_size || exp.next_state.len() != state_size {
                return Err(DdqnError::shape_mismatch(
                    format!("state of width {}", state_size),
                    format!("widths {} / {} at row {}", exp.state.len(), exp.next_state.len(), i),
                ));
            }
            states.row_mut(i).assign(&exp.state);
            next_states.row_mut(i).assign(&exp.next_state);
            actions[i] = exp.action;
            rewards[i] = exp.reward;
            dones[i] = if exp.done { 1.0 } else { 0.0 };
        }

        Ok(TransitionBatch { states, actions, rewards, next_states, dones })
    }

    pub fn len(&self) -> usize {
        self.states.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check every column against the batch size, the network input width and the action count.
    pub fn validate(&self, state_size: usize, num_actions: usize) -> Result<()> {
        let batch_size = self.len();
        let leading = [
            ("actions", self.actions.len()),
            ("rewards", self.rewards.len()),
            ("next_states", self.next_states.nrows()),
            ("dones", self.dones.len()),
        ];
        for (name, len) in leading {
            if len != batch_size {
                return Err(DdqnError::shape_mismatch(
                    format!("{} {}", batch_size, name),
                    format!("{} {}", len, name),
                ));
            }
        }
        if self.states.ncols() != state_size || self.next_states.ncols() != state_size {
            return Err(DdqnError::shape_mismatch(
                format!("[{}, {}]", batch_size, state_size),
                format!("{:?} / {:?}", self.states.dim(), self.next_states.dim()),
            ));
        }
        if let Some(&action) = self.actions.iter().find(|&&a| a >= num_actions) {
            return Err(DdqnError::InvalidAction { action, max_actions: num_actions });
        }
        Ok(())
    }
}
