use rand::Rng;
use serde::{Serialize, Deserialize};

/// Epsilon-greedy exploration with multiplicative decay towards a floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    pub epsilon: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f32, epsilon_min: f32, epsilon_decay: f32) -> Self {
        EpsilonGreedy { epsilon, epsilon_min, epsilon_decay }
    }

    /// Whether the next action should be drawn uniformly at random.
    pub fn explore<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f32>() < self.epsilon
    }

    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
    }

    pub fn set(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }
}
