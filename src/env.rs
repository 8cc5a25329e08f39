//! Environment interface and a single-episode driver.

use log::debug;
use ndarray::Array1;

use crate::agent::{DqnAgent, UpdateRule};
use crate::error::Result;
use crate::replay_buffer::Experience;

/// Result of taking one action.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub next_state: Array1<f32>,
    pub reward: f32,
    pub done: bool,
}

/// A discrete-action environment.
pub trait Environment {
    fn observation_size(&self) -> usize;

    fn action_count(&self) -> usize;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Array1<f32>;

    fn step(&mut self, action: usize) -> Result<StepOutcome>;
}

/// What happened during one call to [`run_episode`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpisodeSummary {
    pub total_reward: f32,
    pub steps: usize,
    /// Learning calls that actually ran
    pub learn_calls: usize,
    /// Mean loss over those calls
    pub mean_loss: Option<f32>,
    /// False when the episode hit `max_steps` first
    pub terminated: bool,
}

/// Play one episode, feeding every transition to `agent.step`, then decay epsilon.
pub fn run_episode<R, E>(agent: &mut DqnAgent<R>, env: &mut E, max_steps: usize) -> Result<EpisodeSummary>
where
    R: UpdateRule,
    E: Environment,
{
    let mut summary = EpisodeSummary::default();
    let mut loss_sum = 0.0;
    let mut state = env.reset();

    while summary.steps < max_steps {
        let action = agent.act(state.view())?;
        let outcome = env.step(action)?;
        summary.total_reward += outcome.reward;
        summary.steps += 1;

        let done = outcome.done;
        let experience = Experience {
            state,
            action,
            reward: outcome.reward,
            next_state: outcome.next_state.clone(),
            done,
        };
        if let Some(loss) = agent.step(experience)? {
            loss_sum += loss;
            summary.learn_calls += 1;
        }

        state = outcome.next_state;
        if done {
            summary.terminated = true;
            break;
        }
    }

    if summary.learn_calls > 0 {
        summary.mean_loss = Some(loss_sum / summary.learn_calls as f32);
    }
    agent.decay_epsilon();
    debug!(
        "episode finished: reward {}, steps {}, epsilon {}",
        summary.total_reward,
        summary.steps,
        agent.epsilon()
    );
    Ok(summary)
}
