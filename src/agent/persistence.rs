//! Checkpoint directories.
//!
//! A checkpoint holds the agent configuration (`config.json`), the online
//! parameters with optimizer state and counters (`checkpoint.bin`), a
//! human-readable hyperparameter record (`hyperparameters.txt`) and, on
//! request, the replay memory (`memory.bin`). The target network is never
//! written: restoring always rebuilds it from the restored online network.
//!
//! A checkpoint directory is always replaced as a whole, so its files come
//! from a single save.

use log::info;
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{DdqnError, Result};
use crate::network::FunctionApproximator;
use crate::optimizer::OptimizerWrapper;
use crate::parameters::Parameters;
use crate::replay_buffer::Experience;
use crate::storage;
use super::config::AgentConfig;
use super::dqn::DqnAgent;
use super::update_rule::{DoubleQ, UpdateRule};

pub const CONFIG_FILE: &str = "config.json";
pub const CHECKPOINT_FILE: &str = "checkpoint.bin";
pub const HYPERPARAMETERS_FILE: &str = "hyperparameters.txt";
pub const MEMORY_FILE: &str = "memory.bin";

const CHECKPOINT_VERSION: u32 = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Also write the replay memory
    pub save_memory: bool,
    /// Replace an existing checkpoint in the same directory
    pub overwrite: bool,
}

#[derive(Serialize, Deserialize)]
struct Checkpoint {
    version: u32,
    online: Parameters,
    optimizer: OptimizerWrapper,
    learn_steps: usize,
    timestep: usize,
    epsilon: f32,
    /// Whether `memory.bin` belongs to this checkpoint
    memory_saved: bool,
}

/// Parse `key: value` lines. Later lines override earlier ones.
pub fn parse_hyperparameters(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

pub fn read_hyperparameters<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, String>> {
    let text = fs::read_to_string(dir.as_ref().join(HYPERPARAMETERS_FILE))?;
    Ok(parse_hyperparameters(&text))
}

/// Refuse to replace anything but an empty directory or, with `overwrite`, a previous checkpoint.
fn check_destination(dir: &Path, overwrite: bool) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    let checkpoint_path = dir.join(CHECKPOINT_FILE);
    if checkpoint_path.exists() {
        if !overwrite {
            return Err(DdqnError::IoError(format!(
                "{} already exists; save with overwrite to replace it",
                checkpoint_path.display()
            )));
        }
        return Ok(());
    }
    if fs::read_dir(dir)?.next().is_some() {
        return Err(DdqnError::IoError(format!(
            "{} is not empty and holds no checkpoint; refusing to replace it",
            dir.display()
        )));
    }
    Ok(())
}

impl<R: UpdateRule> DqnAgent<R> {
    /// Write a checkpoint into `dir`, creating it if needed.
    ///
    /// The files are written into a staging directory beside `dir` which then
    /// replaces `dir` in one rename. A failed save leaves the previous
    /// checkpoint exactly as it was, and a successful one leaves no file from
    /// an earlier save behind.
    pub fn save<P: AsRef<Path>>(&self, dir: P, options: SaveOptions) -> Result<()> {
        let dir = dir.as_ref();
        check_destination(dir, options.overwrite)?;

        let checkpoint = Checkpoint {
            version: CHECKPOINT_VERSION,
            online: self.online.parameters(),
            optimizer: self.optimizer.clone(),
            learn_steps: self.learn_steps,
            timestep: self.timestep,
            epsilon: self.exploration.epsilon,
            memory_saved: options.save_memory,
        };
        let checkpoint = bincode::serialize(&checkpoint)?;
        let memory = if options.save_memory {
            Some(bincode::serialize(&self.memory.to_vec())?)
        } else {
            None
        };
        let mut record = self.config.hyperparameter_record();
        record.push_str(&self.target.hyperparameter_record());

        storage::replace_dir(dir, |staging| {
            self.config.to_json_file(staging.join(CONFIG_FILE))?;
            fs::write(staging.join(CHECKPOINT_FILE), &checkpoint)?;
            fs::write(staging.join(HYPERPARAMETERS_FILE), record.as_bytes())?;
            if let Some(memory) = &memory {
                fs::write(staging.join(MEMORY_FILE), memory)?;
            }
            Ok(())
        })?;

        info!(
            "saved checkpoint to {} at learning step {} (memory: {})",
            dir.display(),
            self.learn_steps,
            options.save_memory
        );
        Ok(())
    }

    /// Second phase of restoring: load a checkpoint into an agent built from its configuration.
    ///
    /// Everything is read and checked before the agent is touched. The target
    /// network is then synchronized from the restored online network.
    pub fn restore_parameters<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();

        let data = fs::read(dir.join(CHECKPOINT_FILE))?;
        let checkpoint: Checkpoint = bincode::deserialize(&data)?;
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(DdqnError::SerializationError(format!(
                "unsupported checkpoint version {}",
                checkpoint.version
            )));
        }

        let record = read_hyperparameters(dir)?;
        let period: usize = record
            .get("target_update_rate")
            .ok_or_else(|| DdqnError::MissingField("target_update_rate".to_string()))?
            .parse()
            .map_err(|err| DdqnError::SerializationError(format!("target_update_rate: {}", err)))?;
        if period == 0 {
            return Err(DdqnError::invalid_parameter("target_update_rate", "must be at least 1"));
        }

        self.online.parameters().ensure_compatible(&checkpoint.online)?;
        checkpoint.optimizer.ensure_compatible(&checkpoint.online)?;

        let memory: Vec<Experience> = if checkpoint.memory_saved {
            bincode::deserialize(&fs::read(dir.join(MEMORY_FILE))?)?
        } else {
            Vec::new()
        };
        for experience in &memory {
            self.check_experience(experience)?;
        }

        self.online.load_parameters(&checkpoint.online)?;
        self.optimizer = checkpoint.optimizer;
        self.learn_steps = checkpoint.learn_steps;
        self.timestep = checkpoint.timestep;
        self.exploration.epsilon = checkpoint.epsilon;
        self.target.set_period(period)?;
        self.config.target_update_rate = period;
        self.memory.restore(memory);
        self.target.synchronize(&self.online)?;

        info!(
            "restored checkpoint from {} at learning step {}",
            dir.display(),
            self.learn_steps
        );
        Ok(())
    }

    /// Build from `dir/config.json` with an explicit rule, then restore parameters.
    pub fn load_with_rule<P: AsRef<Path>>(dir: P, rule: R) -> Result<Self> {
        let dir = dir.as_ref();
        let config = AgentConfig::from_json_file(dir.join(CONFIG_FILE))?;
        let mut agent = DqnAgent::with_rule(config, rule)?;
        agent.restore_parameters(dir)?;
        Ok(agent)
    }
}

impl DqnAgent<DoubleQ> {
    /// Restore a Double DQN agent saved with [`DqnAgent::save`].
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::load_with_rule(dir, DoubleQ)
    }
}
