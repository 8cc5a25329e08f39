//! # ddqn - Double Deep Q-Network agents
//!
//! A Double DQN agent built on `ndarray`: a dense Q-network, uniform experience
//! replay, a target network refreshed on a fixed period, and checkpoint
//! directories that restore the target from the online network.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ddqn::agent::{AgentConfig, DqnAgent};
//! use ddqn::replay_buffer::Experience;
//! use ndarray::array;
//!
//! let mut config = AgentConfig::new(4, 2);
//! config.target_update_rate = 500;
//! let mut agent = DqnAgent::new(config).unwrap();
//!
//! let state = array![0.1, 0.2, -0.3, 0.4];
//! let action = agent.act(state.view()).unwrap();
//! let loss = agent.step(Experience {
//!     state,
//!     action,
//!     reward: 1.0,
//!     next_state: array![0.1, 0.1, -0.2, 0.3],
//!     done: false,
//! }).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions
//! - [`agent`] - The agent, its update rules, target network and persistence
//! - [`batch`] - Stacked transition batches
//! - [`env`] - Environment trait and episode driver
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers, dropout and weight initialization
//! - [`loss`] - Loss functions for training
//! - [`network`] - Q-network and the function approximator interface
//! - [`optimizer`] - Optimization algorithms
//! - [`parameters`] - Parameter snapshots
//! - [`replay_buffer`] - Experience replay

pub mod activations;
pub mod agent;
pub mod batch;
pub mod env;
pub mod error;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optimizer;
pub mod parameters;
pub mod replay_buffer;
pub mod storage;

#[cfg(test)]
mod tests;
