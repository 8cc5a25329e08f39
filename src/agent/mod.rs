//! # Deep Q-Network Agents
//!
//! [`DqnAgent`] learns action-values from replayed experience and keeps a
//! lagging target network for stable bootstrapped targets.
//!
//! ## Components
//!
//! - **Update rule** ([`UpdateRule`]): how `V(s')` is estimated. [`DoubleQ`]
//!   selects with the online network and evaluates with the target network;
//!   [`VanillaQ`] uses the target network for both.
//! - **Target network** ([`TargetNetwork`]): full parameter copy every
//!   `target_update_rate` learning calls, held in inference mode.
//! - **Exploration** ([`EpsilonGreedy`]): epsilon-greedy with multiplicative decay.
//! - **Persistence** ([`SaveOptions`]): checkpoint directories; the target is
//!   always rebuilt from the online network on restore.
//!
//! ## Learning step
//!
//! [`DqnAgent::learn`] samples a batch, computes targets, takes one optimizer
//! step on the online network, increments the step counter and then asks the
//! target network whether the new count is a multiple of its period. The first
//! synchronization after construction therefore happens on learning call
//! `target_update_rate`.
//!
//! ```rust,no_run
//! use ddqn::agent::{DqnAgentBuilder, SaveOptions};
//!
//! let mut agent = DqnAgentBuilder::new()
//!     .layer_sizes(&[4, 128, 128, 2])
//!     .target_update_rate(1000)
//!     .build()
//!     .unwrap();
//!
//! // ... agent.step(experience) inside an environment loop ...
//!
//! agent.save("checkpoints/run-1", SaveOptions { save_memory: true, overwrite: true }).unwrap();
//! let restored = ddqn::agent::DqnAgent::load("checkpoints/run-1").unwrap();
//! assert!(restored.target_in_sync());
//! ```

pub mod builder;
pub mod config;
pub mod dqn;
pub mod exploration;
pub mod persistence;
pub mod target;
pub mod update_rule;

pub use builder::DqnAgentBuilder;
pub use config::AgentConfig;
pub use dqn::DqnAgent;
pub use exploration::EpsilonGreedy;
pub use persistence::SaveOptions;
pub use target::TargetNetwork;
pub use update_rule::{DoubleQ, UpdateRule, VanillaQ};
