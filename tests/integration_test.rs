use ddqn::agent::{DqnAgent, DqnAgentBuilder, SaveOptions};
use ddqn::env::{run_episode, Environment, StepOutcome};
use ddqn::error::{DdqnError, Result};
use ddqn::network::FunctionApproximator;
use ddqn::optimizer::OptimizerConfig;
use ndarray::{array, Array1};

/// Corridor of `length` cells; reaching the right end pays 1 and ends the episode.
struct ChainWalk {
    length: usize,
    position: usize,
}

impl ChainWalk {
    fn new(length: usize) -> Self {
        ChainWalk { length, position: 0 }
    }

    fn observation(&self) -> Array1<f32> {
        let mut obs = Array1::<f32>::zeros(self.length);
        obs[self.position] = 1.0;
        obs
    }
}

impl Environment for ChainWalk {
    fn observation_size(&self) -> usize {
        self.length
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Array1<f32> {
        self.position = 0;
        self.observation()
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome> {
        match action {
            0 => self.position = self.position.saturating_sub(1),
            1 => self.position = (self.position + 1).min(self.length - 1),
            _ => return Err(DdqnError::InvalidAction { action, max_actions: 2 }),
        }
        let done = self.position == self.length - 1;
        Ok(StepOutcome {
            next_state: self.observation(),
            reward: if done { 1.0 } else { 0.0 },
            done,
        })
    }
}

/// One-step bandit: action 1 pays 1, action 0 pays nothing.
struct TwoArmedBandit;

impl Environment for TwoArmedBandit {
    fn observation_size(&self) -> usize {
        1
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Array1<f32> {
        array![1.0]
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome> {
        Ok(StepOutcome {
            next_state: array![1.0],
            reward: if action == 1 { 1.0 } else { 0.0 },
            done: true,
        })
    }
}

#[test]
fn test_chain_walk_training_keeps_target_schedule() {
    let mut env = ChainWalk::new(5);
    let period = 5;
    let mut agent = DqnAgentBuilder::for_environment(&env)
        .hidden_layers(&[16])
        .batch_size(8)
        .memory_size(500)
        .update_rate(1)
        .target_update_rate(period)
        .epsilon(1.0, 0.05, 0.95)
        .seed(17)
        .build()
        .unwrap();

    let mut total_learn_calls = 0;
    for _ in 0..30 {
        let summary = run_episode(&mut agent, &mut env, 50).unwrap();
        assert!(summary.steps <= 50);
        if let Some(loss) = summary.mean_loss {
            assert!(loss.is_finite());
        }
        total_learn_calls += summary.learn_calls;
    }

    assert!(agent.learn_steps() > 0);
    assert_eq!(agent.learn_steps(), total_learn_calls);
    assert_eq!(
        agent.target_manager().synchronizations(),
        1 + agent.learn_steps() / period
    );
    assert_eq!(agent.target_in_sync(), agent.learn_steps() % period == 0);
    assert!(agent.epsilon() < 1.0);
}

#[test]
fn test_bandit_prefers_paying_arm() {
    let mut env = TwoArmedBandit;
    let mut agent = DqnAgentBuilder::for_environment(&env)
        .hidden_layers(&[8])
        .batch_size(16)
        .update_rate(1)
        .target_update_rate(10)
        .optimizer(OptimizerConfig::default())
        .learning_rate(0.01)
        .epsilon(1.0, 1.0, 1.0)
        .seed(5)
        .build()
        .unwrap();

    for _ in 0..400 {
        run_episode(&mut agent, &mut env, 1).unwrap();
    }

    let q = agent.q_values(array![1.0].view()).unwrap();
    assert!(q[1] > q[0], "q-values {:?}", q);
    assert_eq!(agent.greedy_action(array![1.0].view()).unwrap(), 1);
}

#[test]
fn test_checkpoint_resume_matches_uninterrupted_agent() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = ChainWalk::new(4);
    let mut agent = DqnAgentBuilder::for_environment(&env)
        .hidden_layers(&[8])
        .batch_size(4)
        .update_rate(1)
        .target_update_rate(3)
        .seed(2)
        .build()
        .unwrap();
    for _ in 0..5 {
        run_episode(&mut agent, &mut env, 20).unwrap();
    }

    agent
        .save(dir.path(), SaveOptions { save_memory: true, overwrite: false })
        .unwrap();
    let restored = DqnAgent::load(dir.path()).unwrap();

    assert!(restored.online().parameters().bit_eq(&agent.online().parameters()));
    assert!(restored.target_in_sync());
    assert_eq!(restored.learn_steps(), agent.learn_steps());
    assert_eq!(restored.timestep(), agent.timestep());
    assert_eq!(restored.memory().len(), agent.memory().len());
    assert_eq!(restored.epsilon(), agent.epsilon());
    assert_eq!(
        restored.target().parameters(),
        restored.online().parameters()
    );
}

#[test]
fn test_environment_errors_propagate() {
    struct Broken;
    impl Environment for Broken {
        fn observation_size(&self) -> usize {
            1
        }
        fn action_count(&self) -> usize {
            2
        }
        fn reset(&mut self) -> Array1<f32> {
            array![0.0]
        }
        fn step(&mut self, _action: usize) -> Result<StepOutcome> {
            Err(DdqnError::TrainingError("simulator crashed".to_string()))
        }
    }

    let mut env = Broken;
    let mut agent = DqnAgentBuilder::for_environment(&env).seed(1).build().unwrap();
    let err = run_episode(&mut agent, &mut env, 10).unwrap_err();
    assert_eq!(err, DdqnError::TrainingError("simulator crashed".to_string()));
    assert_eq!(agent.timestep(), 0);
}
