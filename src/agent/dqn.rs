use log::{debug, info, warn};
use ndarray::{Array1, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::batch::TransitionBatch;
use crate::error::{DdqnError, Result};
use crate::network::{FunctionApproximator, QNetwork};
use crate::optimizer::OptimizerWrapper;
use crate::replay_buffer::{Experience, ExperienceStore, ReplayBuffer};
use super::config::AgentConfig;
use super::exploration::EpsilonGreedy;
use super::target::TargetNetwork;
use super::update_rule::{argmax_rows, evaluate_batch, DoubleQ, UpdateRule};

/// Deep Q-Network agent with a lagging target network.
///
/// The update rule is a type parameter: [`DoubleQ`] (the default) decouples
/// action selection from evaluation, [`VanillaQ`](super::VanillaQ) does not.
///
/// # Example
///
/// ```rust
/// use ddqn::agent::{AgentConfig, DqnAgent};
/// use ddqn::replay_buffer::Experience;
/// use ndarray::array;
///
/// let mut config = AgentConfig::new(2, 3);
/// config.batch_size = 2;
/// config.update_rate = 1;
/// config.seed = Some(42);
/// let mut agent = DqnAgent::new(config).unwrap();
///
/// let state = array![0.1, -0.2];
/// let action = agent.act(state.view()).unwrap();
/// let experience = Experience {
///     state,
///     action,
///     reward: 1.0,
///     next_state: array![0.2, -0.1],
///     done: false,
/// };
///
/// // Not enough history yet: the learning step is skipped.
/// assert_eq!(agent.step(experience.clone()).unwrap(), None);
/// // Two transitions stored, so this one learns.
/// assert!(agent.step(experience).unwrap().is_some());
/// assert_eq!(agent.learn_steps(), 1);
/// ```
pub struct DqnAgent<R = DoubleQ> {
    pub(super) config: AgentConfig,
    pub(super) online: QNetwork,
    pub(super) target: TargetNetwork<QNetwork>,
    pub(super) optimizer: OptimizerWrapper,
    pub(super) memory: ReplayBuffer,
    pub(super) exploration: EpsilonGreedy,
    rule: R,
    /// Completed learning calls
    pub(super) learn_steps: usize,
    /// Calls to `step`
    pub(super) timestep: usize,
    rng: StdRng,
}

impl DqnAgent<DoubleQ> {
    /// Build a Double DQN agent.
    pub fn new(config: AgentConfig) -> Result<Self> {
        Self::with_rule(config, DoubleQ)
    }
}

impl<R: UpdateRule> DqnAgent<R> {
    /// Build an agent with an explicit update rule.
    ///
    /// Online and target networks are initialised independently, then the
    /// target is overwritten with the online parameters.
    pub fn with_rule(config: AgentConfig, rule: R) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let online = QNetwork::new_using(&config.network, &mut rng)?;
        let target_network = QNetwork::new_using(&config.network, &mut rng)?;
        let target = TargetNetwork::new(&online, target_network, config.target_update_rate)?;
        let optimizer = config.optimizer.build(&online.parameters());
        let memory = match config.seed {
            Some(seed) => ReplayBuffer::with_seed(config.memory_size, seed.wrapping_add(1)),
            None => ReplayBuffer::new(config.memory_size),
        };
        let exploration = EpsilonGreedy::new(config.epsilon_start, config.epsilon_min, config.epsilon_decay);

        info!(
            "created {} agent: layers {:?}, gamma {}, batch {}, target period {}",
            rule.name(),
            config.network.layer_sizes,
            config.gamma,
            config.batch_size,
            config.target_update_rate,
        );

        Ok(DqnAgent {
            config,
            online,
            target,
            optimizer,
            memory,
            exploration,
            rule,
            learn_steps: 0,
            timestep: 0,
            rng,
        })
    }

    fn check_state(&self, state: &ArrayView1<f32>) -> Result<()> {
        if state.len() != self.online.input_size() {
            return Err(DdqnError::shape_mismatch(
                self.online.input_size().to_string(),
                state.len().to_string(),
            ));
        }
        Ok(())
    }

    /// Select an action with the epsilon-greedy policy.
    pub fn act(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        self.check_state(&state)?;
        if self.exploration.explore(&mut self.rng) {
            Ok(self.rng.gen_range(0..self.online.num_actions()))
        } else {
            self.greedy_action(state)
        }
    }

    /// Action with the highest online value.
    pub fn greedy_action(&self, state: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.q_values(state)?;
        let best = argmax_rows(q_values.view().insert_axis(Axis(0)));
        Ok(best[0])
    }

    pub fn q_values(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.check_state(&state)?;
        self.online.q_values(state)
    }

    /// Fails unless `experience` fits the online network's input width and action count.
    pub(super) fn check_experience(&self, experience: &Experience) -> Result<()> {
        self.check_state(&experience.state.view())?;
        self.check_state(&experience.next_state.view())?;
        if experience.action >= self.online.num_actions() {
            return Err(DdqnError::InvalidAction {
                action: experience.action,
                max_actions: self.online.num_actions(),
            });
        }
        Ok(())
    }

    /// Store a transition without learning.
    pub fn remember(&mut self, experience: Experience) -> Result<()> {
        self.check_experience(&experience)?;
        self.memory.push(experience);
        Ok(())
    }

    /// Store a transition and learn every `update_rate` calls.
    ///
    /// Returns the loss when a learning step ran.
    pub fn step(&mut self, experience: Experience) -> Result<Option<f32>> {
        self.remember(experience)?;
        self.timestep += 1;
        if self.timestep % self.config.update_rate == 0 {
            self.learn()
        } else {
            Ok(None)
        }
    }

    /// One learning step on a batch sampled from replay memory.
    ///
    /// Returns `Ok(None)` without touching any state when memory cannot
    /// supply a full batch yet.
    pub fn learn(&mut self) -> Result<Option<f32>> {
        let batch = match self.memory.sample(self.config.batch_size) {
            Ok(batch) => batch,
            Err(err) if err.is_recoverable() => {
                debug!("skipping learning step: {}", err);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        self.learn_from_batch(&batch).map(Some)
    }

    /// One learning step on an explicit batch.
    ///
    /// The step counter is incremented before the synchronization check, so
    /// the target is refreshed on learning calls `period`, `2 * period`, ...
    pub fn learn_from_batch(&mut self, batch: &TransitionBatch) -> Result<f32> {
        let evaluation = evaluate_batch(
            &self.rule,
            &mut self.online,
            self.target.network(),
            batch,
            self.config.gamma,
        )?;
        let gradients = self.online.backward(evaluation.output_gradient.view())?;
        self.online
            .apply_gradients(&mut self.optimizer, &gradients, self.config.learning_rate)?;

        self.learn_steps += 1;
        self.target.maybe_synchronize(&self.online, self.learn_steps)?;

        if !evaluation.loss.is_finite() {
            warn!("non-finite loss {} at learning step {}", evaluation.loss, self.learn_steps);
        }
        Ok(evaluation.loss)
    }

    /// Copy the online parameters into the target network now.
    pub fn synchronize_target(&mut self) -> Result<()> {
        self.target.synchronize(&self.online)
    }

    pub fn decay_epsilon(&mut self) {
        self.exploration.decay();
    }

    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.exploration.set(epsilon);
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn online(&self) -> &QNetwork {
        &self.online
    }

    pub fn target(&self) -> &QNetwork {
        self.target.network()
    }

    pub fn target_manager(&self) -> &TargetNetwork<QNetwork> {
        &self.target
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn learn_steps(&self) -> usize {
        self.learn_steps
    }

    pub fn timestep(&self) -> usize {
        self.timestep
    }

    /// Whether the target network currently equals the online network bit for bit.
    pub fn target_in_sync(&self) -> bool {
        self.online.parameters().bit_eq(&self.target.network().parameters())
    }
}
