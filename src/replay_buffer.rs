use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};
use std::collections::VecDeque;

use crate::batch::TransitionBatch;
use crate::error::{DdqnError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

/// Where the learning step draws its batches from.
pub trait ExperienceStore {
    fn push(&mut self, experience: Experience);

    /// Draw `batch_size` distinct transitions, or `InsufficientData` if fewer are stored.
    fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bounded FIFO of transitions with uniform sampling without replacement.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Experience>,
    capacity: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_entropy())
    }

    /// Deterministic sampling for reproducible runs.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity,
            rng,
        }
    }

    pub fn add(&mut self, experience: Experience) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(experience);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Snapshot of the stored transitions, oldest first.
    pub fn to_vec(&self) -> Vec<Experience> {
        self.buffer.iter().cloned().collect()
    }

    /// Replace the contents, keeping only the newest `capacity` transitions.
    pub fn restore(&mut self, experiences: Vec<Experience>) {
        self.buffer.clear();
        for experience in experiences {
            self.add(experience);
        }
    }
}

impl ExperienceStore for ReplayBuffer {
    fn push(&mut self, experience: Experience) {
        self.add(experience);
    }

    fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch> {
        let available = self.buffer.len();
        if batch_size == 0 || available < batch_size {
            return Err(DdqnError::InsufficientData { requested: batch_size, available });
        }
        let indices = rand::seq::index::sample(&mut self.rng, available, batch_size);
        let experiences: Vec<&Experience> = indices.iter().map(|i| &self.buffer[i]).collect();
        TransitionBatch::from_experiences(&experiences)
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }
}
