use crate::activations::Activation;
use crate::env::Environment;
use crate::error::{DdqnError, Result};
use crate::network::Device;
use crate::optimizer::OptimizerConfig;
use super::config::AgentConfig;
use super::dqn::DqnAgent;
use super::update_rule::{DoubleQ, UpdateRule};

/// Builder pattern for DqnAgent
///
/// ```rust
/// use ddqn::agent::DqnAgentBuilder;
///
/// let agent = DqnAgentBuilder::new()
///     .layer_sizes(&[4, 32, 2])
///     .gamma(0.95)
///     .target_update_rate(50)
///     .seed(1)
///     .build()
///     .unwrap();
/// assert_eq!(agent.target_manager().period(), 50);
/// ```
pub struct DqnAgentBuilder {
    layer_sizes: Vec<usize>,
    config: AgentConfig,
}

impl DqnAgentBuilder {
    pub fn new() -> Self {
        DqnAgentBuilder {
            layer_sizes: vec![],
            config: AgentConfig::new(0, 0),
        }
    }

    /// Size the input and output layers from an environment, keeping the default hidden layers.
    pub fn for_environment<E: Environment>(env: &E) -> Self {
        let config = AgentConfig::new(env.observation_size(), env.action_count());
        DqnAgentBuilder {
            layer_sizes: config.network.layer_sizes.clone(),
            config,
        }
    }

    /// Input width, hidden widths and action count.
    pub fn layer_sizes(mut self, sizes: &[usize]) -> Self {
        self.layer_sizes = sizes.to_vec();
        self
    }

    pub fn hidden_layers(mut self, hidden: &[usize]) -> Self {
        if let (Some(&input), Some(&output)) = (self.layer_sizes.first(), self.layer_sizes.last()) {
            self.layer_sizes = std::iter::once(input)
                .chain(hidden.iter().copied())
                .chain(std::iter::once(output))
                .collect();
        }
        self
    }

    pub fn hidden_activation(mut self, activation: Activation) -> Self {
        self.config.network.hidden_activation = activation;
        self
    }

    pub fn dropout(mut self, rate: f32) -> Self {
        self.config.network.dropout = rate;
        self
    }

    pub fn device(mut self, device: Device) -> Self {
        self.config.network.device = device;
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.config.optimizer = optimizer;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn epsilon(mut self, start: f32, min: f32, decay: f32) -> Self {
        self.config.epsilon_start = start;
        self.config.epsilon_min = min;
        self.config.epsilon_decay = decay;
        self
    }

    pub fn memory_size(mut self, memory_size: usize) -> Self {
        self.config.memory_size = memory_size;
        self
    }

    pub fn update_rate(mut self, update_rate: usize) -> Self {
        self.config.update_rate = update_rate;
        self
    }

    pub fn target_update_rate(mut self, period: usize) -> Self {
        self.config.target_update_rate = period;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// The validated configuration the agent would be built from.
    pub fn into_config(self) -> Result<AgentConfig> {
        if self.layer_sizes.len() < 2 {
            return Err(DdqnError::InvalidParameter {
                name: "layer_sizes".to_string(),
                reason: "Must have at least 2 layers".to_string(),
            });
        }
        let mut config = self.config;
        config.network.layer_sizes = self.layer_sizes;
        config.validate()?;
        Ok(config)
    }

    pub fn build(self) -> Result<DqnAgent<DoubleQ>> {
        DqnAgent::new(self.into_config()?)
    }

    pub fn build_with_rule<R: UpdateRule>(self, rule: R) -> Result<DqnAgent<R>> {
        DqnAgent::with_rule(self.into_config()?, rule)
    }
}

impl Default for DqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
