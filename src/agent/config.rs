use serde::{Serialize, Deserialize};
use std::path::Path;

use crate::error::{DdqnError, Result};
use crate::network::NetworkConfig;
use crate::optimizer::OptimizerConfig;
use crate::storage;

/// Every hyperparameter of a [`DqnAgent`](super::DqnAgent).
///
/// Serialized to `config.json` alongside checkpoints so an agent can be
/// reconstructed before its parameters are restored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub network: NetworkConfig,
    pub optimizer: OptimizerConfig,
    /// Discount factor in (0, 1]
    pub gamma: f32,
    pub learning_rate: f32,
    pub batch_size: usize,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    /// Multiplicative decay applied by `decay_epsilon`
    pub epsilon_decay: f32,
    /// Replay memory capacity
    pub memory_size: usize,
    /// Environment steps between learning calls
    pub update_rate: usize,
    /// Learning calls between target network synchronisations
    pub target_update_rate: usize,
    /// Seeds weight init, exploration and replay sampling
    pub seed: Option<u64>,
}

impl AgentConfig {
    pub fn new(state_size: usize, action_size: usize) -> Self {
        AgentConfig {
            network: NetworkConfig::new(state_size, action_size),
            optimizer: OptimizerConfig::default(),
            gamma: 0.99,
            learning_rate: 0.001,
            batch_size: 32,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.999,
            memory_size: 100_000,
            update_rate: 4,
            target_update_rate: 1000,
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.optimizer.validate()?;

        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(DdqnError::invalid_parameter("gamma", "must be in (0, 1]"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(DdqnError::invalid_parameter("learning_rate", "must be positive and finite"));
        }
        if self.batch_size == 0 {
            return Err(DdqnError::invalid_parameter("batch_size", "must be at least 1"));
        }
        if self.memory_size < self.batch_size {
            return Err(DdqnError::invalid_parameter("memory_size", "must hold at least one batch"));
        }
        if !(0.0..=1.0).contains(&self.epsilon_start) || !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(DdqnError::invalid_parameter("epsilon", "must be in [0, 1]"));
        }
        if self.epsilon_min > self.epsilon_start {
            return Err(DdqnError::invalid_parameter("epsilon_min", "must not exceed epsilon_start"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(DdqnError::invalid_parameter("epsilon_decay", "must be in (0, 1]"));
        }
        if self.update_rate == 0 {
            return Err(DdqnError::invalid_parameter("update_rate", "must be at least 1"));
        }
        if self.target_update_rate == 0 {
            return Err(DdqnError::invalid_parameter("target_update_rate", "must be at least 1"));
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AgentConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        storage::write_atomically(path.as_ref(), text.as_bytes())
    }

    /// Human-readable `key: value` lines for the base agent's hyperparameters.
    pub fn hyperparameter_record(&self) -> String {
        format!(
            "gamma: {}\nlr: {}\nbatch_size: {}\nepsilon_min: {}\nepsilon_decay: {}\nmemory_size: {}\nupdate_rate: {}\n",
            self.gamma,
            self.learning_rate,
            self.batch_size,
            self.epsilon_min,
            self.epsilon_decay,
            self.memory_size,
            self.update_rate,
        )
    }
}
